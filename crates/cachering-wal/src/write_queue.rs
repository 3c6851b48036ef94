//! Batching, time/size-triggered flusher that feeds the WAL (§4.4).
//!
//! Grounded in `examples/original_source/write_queue.{h,cpp}`: a queue
//! guarded by a mutex, a condition variable woken on enqueue and on
//! shutdown, and a single flusher that drains the queue into one batch per
//! wake. The original's `std::thread` + `std::condition_variable` becomes a
//! `tokio` task woken by a [`tokio::sync::Notify`]; the original's
//! `running_` atomic bool survives unchanged as a state machine, since
//! the queue needs a distinct "accepting stop() but not yet joined"
//! phase (`Stopping`) on top of the boolean the C++ used.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::entry::LogEntry;
use crate::wal::Wal;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// The queue's lifecycle (§4.4): `Idle -> Running -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Batches [`LogEntry`] writes and hands them to a [`Wal`] as single framed
/// batches, triggered by whichever comes first: `batch_size` entries
/// queued, or `flush_interval` elapsing.
///
/// Producers (`log_put`/`log_remove`) never block on I/O — they only push
/// onto an in-memory queue and notify the flusher (§4.4 "producers never
/// block on I/O").
pub struct WriteQueue {
    queue: Mutex<VecDeque<LogEntry>>,
    notify: Notify,
    state: Mutex<QueueState>,
    wal: Arc<Wal>,
    node_id: String,
    sequence_number: AtomicU64,
    batch_size: usize,
    flush_interval: Duration,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl WriteQueue {
    /// Builds a queue over an already-opened `wal`, with the reference
    /// defaults for batch size and flush interval.
    pub fn new(wal: Arc<Wal>, node_id: impl Into<String>) -> Arc<Self> {
        Self::with_config(wal, node_id, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL)
    }

    /// Builds a queue with explicit `batch_size` and `flush_interval`.
    pub fn with_config(
        wal: Arc<Wal>,
        node_id: impl Into<String>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            state: Mutex::new(QueueState::Idle),
            wal,
            node_id: node_id.into(),
            sequence_number: AtomicU64::new(0),
            batch_size,
            flush_interval,
            flush_task: Mutex::new(None),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> QueueState {
        *self.state.lock()
    }

    /// Number of entries currently queued but not yet flushed.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transitions `Idle -> Running` and spawns the flusher task. A no-op
    /// if already running.
    pub fn start(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if *state != QueueState::Idle {
            return;
        }
        *state = QueueState::Running;
        drop(state);

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.flush_loop().await });
        *self.flush_task.lock() = Some(handle);
        tracing::info!(node_id = %self.node_id, "write queue started");
    }

    /// Transitions to `Stopping`, wakes the flusher, waits for it to drain
    /// and exit, then transitions to `Stopped`. Idempotent — calling it
    /// twice, or before `start()`, is harmless (§4.4).
    pub async fn stop(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            match *state {
                QueueState::Idle => {
                    *state = QueueState::Stopped;
                    return;
                }
                QueueState::Stopping | QueueState::Stopped => return,
                QueueState::Running => *state = QueueState::Stopping,
            }
        }
        self.notify.notify_one();

        let handle = self.flush_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        *self.state.lock() = QueueState::Stopped;
        tracing::info!(node_id = %self.node_id, "write queue stopped");
    }

    fn enqueue(&self, entry: LogEntry) {
        let len = {
            let mut queue = self.queue.lock();
            queue.push_back(entry);
            queue.len()
        };
        if len >= self.batch_size {
            self.notify.notify_one();
        }
    }

    /// Builds and enqueues a PUT entry, assigning it the next sequence
    /// number.
    pub fn log_put(&self, key: impl Into<String>, value: impl Into<String>, ttl: i64) {
        let seq = self.sequence_number.fetch_add(1, Ordering::Relaxed) + 1;
        self.enqueue(LogEntry::put(self.node_id.clone(), key, value, ttl, seq));
    }

    /// Builds and enqueues a REMOVE entry, assigning it the next sequence
    /// number.
    pub fn log_remove(&self, key: impl Into<String>) {
        let seq = self.sequence_number.fetch_add(1, Ordering::Relaxed) + 1;
        self.enqueue(LogEntry::remove(self.node_id.clone(), key, seq));
    }

    /// Drains the queue and hands the drained batch to the WAL. A WAL
    /// write failure is logged but does not propagate — the batch is lost
    /// and the queue carries on (§4.4 failure handling, §7).
    fn flush(&self) {
        let batch: Vec<LogEntry> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };
        if batch.is_empty() {
            return;
        }
        let n = batch.len();
        if let Err(e) = self.wal.write_batch(&self.node_id, &batch) {
            tracing::error!(error = %e, batch_size = n, "WAL batch write failed, entries lost");
        } else {
            tracing::debug!(batch_size = n, "flushed batch to WAL");
        }
    }

    async fn flush_loop(self: Arc<Self>) {
        loop {
            let wait = self.notify.notified();
            tokio::select! {
                _ = wait => {}
                _ = tokio::time::sleep(self.flush_interval) => {}
            }

            if *self.state.lock() == QueueState::Stopping && self.is_empty() {
                break;
            }

            self.flush();

            if *self.state.lock() == QueueState::Stopping && self.is_empty() {
                break;
            }
        }
        // final drain so nothing enqueued during shutdown is lost.
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachering_core::Cache;

    #[tokio::test]
    async fn start_then_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let wal = Arc::new(Wal::open(dir.path().join("wal.log")).unwrap());
        let queue = WriteQueue::new(wal, "node-a");
        queue.start();
        queue.start(); // no-op
        queue.stop().await;
        queue.stop().await; // no-op
        assert_eq!(queue.state(), QueueState::Stopped);
    }

    #[tokio::test]
    async fn size_triggered_flush_drains_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let wal = Arc::new(Wal::open(&path).unwrap());
        let queue = WriteQueue::with_config(wal, "node-a", 3, Duration::from_secs(3600));
        queue.start();

        queue.log_put("k1", "v1", 60);
        queue.log_put("k2", "v2", 60);
        queue.log_put("k3", "v3", 60);

        // give the flusher a moment to wake and drain.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.len(), 0);

        queue.stop().await;

        let cache = Cache::new(8).unwrap();
        let applied = crate::recovery::recover_from_wal(&path, "node-a", &cache).unwrap();
        assert_eq!(applied, 3);
    }

    #[tokio::test]
    async fn stop_drains_remaining_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let wal = Arc::new(Wal::open(&path).unwrap());
        let queue = WriteQueue::with_config(wal, "node-a", 100, Duration::from_secs(3600));
        queue.start();

        queue.log_put("k1", "v1", 60);
        queue.log_remove("k1");

        queue.stop().await;

        let cache = Cache::new(8).unwrap();
        let applied = crate::recovery::recover_from_wal(&path, "node-a", &cache).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(cache.get("k1"), None);
    }

    #[tokio::test]
    async fn sequence_numbers_are_strictly_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let wal = Arc::new(Wal::open(dir.path().join("wal.log")).unwrap());
        let queue = WriteQueue::with_config(wal, "node-a", 1000, Duration::from_secs(3600));
        queue.log_put("a", "1", 60);
        queue.log_put("b", "2", 60);
        let seqs: Vec<u64> = queue
            .queue
            .lock()
            .iter()
            .map(|e| e.sequence_number)
            .collect();
        assert_eq!(seqs, vec![1, 2]);
    }
}
