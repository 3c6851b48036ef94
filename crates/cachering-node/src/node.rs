//! The node coordinator (§4.6): owns the ring, cache, write queue, and a
//! peer channel pool; implements the `CacheService` RPC contract with
//! primary-forwarding and fan-out replication.
//!
//! Grounded directly in `examples/original_source/node.{h,cpp}`: the
//! constructor's "add self and peers to the ring, then recover from WAL
//! before serving" sequencing, the `Get`/`Put`/`Remove` handler logic, and
//! `ReplicateToNode`'s fire-and-join-all fan-out all carry over; the
//! `grpc::Server` + `std::thread` cleanup loop becomes a `tonic` server
//! task plus a `tokio::time::interval` expiry task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use cachering_core::{Cache, NodeId, Ring};
use cachering_replication::Plan;
use cachering_wal::{recover_from_wal, Wal, WriteQueue};

use cachering_proto::cache_service_client::CacheServiceClient;
use cachering_proto::cache_service_server::{CacheService, CacheServiceServer};
use cachering_proto::{GetRequest, GetResponse, PutRequest, PutResponse, RemoveRequest, RemoveResponse};

use crate::error::{Error, Result};
use crate::transport::ChannelPool;

/// Virtual nodes per physical node (§6 configuration defaults).
pub const DEFAULT_VIRTUAL_NODES: usize = 52;
/// Default cache capacity (§6).
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
/// Default replication factor (§6).
pub const DEFAULT_REPLICATION_FACTOR: usize = 3;
/// Concurrent handler bound across the whole node, mirroring the
/// original's `grpc::ResourceQuota::SetMaxThreads(12)` (§5): one shared
/// pool, not a per-connection limit, since peer connections (forwarding,
/// replication) and client connections would otherwise each get their
/// own budget of `MAX_CONCURRENT_HANDLERS`.
pub const MAX_CONCURRENT_HANDLERS: usize = 12;
/// Expiry sweep cadence (§6).
pub const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for constructing a [`Node`] (§6 configuration defaults).
pub struct NodeConfig {
    pub address: String,
    pub peers: Vec<String>,
    pub cache_capacity: usize,
    pub wal_path: std::path::PathBuf,
    pub replication_factor: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl NodeConfig {
    pub fn new(address: impl Into<String>, peers: Vec<String>, wal_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            address: address.into(),
            peers,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            wal_path: wal_path.into(),
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            batch_size: cachering_wal::write_queue::DEFAULT_BATCH_SIZE,
            flush_interval: cachering_wal::write_queue::DEFAULT_FLUSH_INTERVAL,
        }
    }
}

struct RunningTasks {
    server_shutdown: Option<oneshot::Sender<()>>,
    server_task: Option<JoinHandle<()>>,
    expiry_task: Option<JoinHandle<()>>,
}

/// Orchestrates the ring, cache, write queue, and recovery manager for one
/// cluster member, and serves the `CacheService` RPC contract (§4.6).
pub struct Node {
    address: NodeId,
    ring: Ring,
    cache: Arc<Cache>,
    write_queue: Arc<WriteQueue>,
    channels: ChannelPool,
    replication_factor: usize,
    handler_slots: Semaphore,
    tasks: Mutex<RunningTasks>,
}

impl Node {
    /// Builds a node, adds itself and its peers to the ring, and runs
    /// recovery synchronously before any request can be served (§4.6
    /// constructor contract).
    pub fn new(config: NodeConfig) -> Result<Arc<Self>> {
        let address = NodeId::new(config.address)?;

        let ring = Ring::with_default_vnodes();
        ring.add_node(address.clone());
        for peer in config.peers {
            ring.add_node(NodeId::new(peer)?);
        }

        let cache = Arc::new(Cache::new(config.cache_capacity)?);

        let wal = Arc::new(Wal::open(&config.wal_path)?);

        let applied = recover_from_wal(&config.wal_path, address.as_str(), &cache)?;
        tracing::info!(applied, "recovery complete");

        let write_queue = WriteQueue::with_config(
            wal,
            address.as_str(),
            config.batch_size,
            config.flush_interval,
        );

        Ok(Arc::new(Self {
            address,
            ring,
            cache,
            write_queue,
            channels: ChannelPool::new(),
            replication_factor: config.replication_factor,
            handler_slots: Semaphore::new(MAX_CONCURRENT_HANDLERS),
            tasks: Mutex::new(RunningTasks {
                server_shutdown: None,
                server_task: None,
                expiry_task: None,
            }),
        }))
    }

    /// Begins serving RPCs and spawns the cache's background expiry task
    /// (§4.6 lifecycle).
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.write_queue.start();

        let expiry_cache = Arc::clone(&self.cache);
        let expiry_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let removed = expiry_cache.sweep_expired(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "expiry sweep removed entries");
                }
            }
        });

        let addr: SocketAddr = self
            .address
            .as_str()
            .parse()
            .map_err(|_| Error::NoResponsibleNodes)?;
        let (tx, rx) = oneshot::channel();
        let service = CacheServiceServer::new(Arc::clone(self));
        let server_task = tokio::spawn(async move {
            let result = Server::builder()
                .add_service(service)
                .serve_with_shutdown(addr, async {
                    let _ = rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "gRPC server exited with error");
            }
        });

        let mut tasks = self.tasks.lock();
        tasks.expiry_task = Some(expiry_task);
        tasks.server_shutdown = Some(tx);
        tasks.server_task = Some(server_task);
        tracing::info!(address = %self.address, "node started");
        Ok(())
    }

    /// Tears everything down in reverse order: serving, expiry, write
    /// queue (§4.6 lifecycle). The WAL file closes when its last `Arc`
    /// drops.
    pub async fn stop(self: &Arc<Self>) {
        let (shutdown, server_task, expiry_task) = {
            let mut tasks = self.tasks.lock();
            (
                tasks.server_shutdown.take(),
                tasks.server_task.take(),
                tasks.expiry_task.take(),
            )
        };

        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }
        if let Some(handle) = server_task {
            let _ = handle.await;
        }
        if let Some(handle) = expiry_task {
            handle.abort();
        }
        self.write_queue.stop().await;
        tracing::info!(address = %self.address, "node stopped");
    }

    fn client_for(&self, peer: &NodeId) -> CacheServiceClient<tonic::transport::Channel> {
        CacheServiceClient::new(self.channels.get_or_create(peer))
    }

    async fn forward_get(&self, primary: &NodeId, key: String) -> Result<Response<GetResponse>> {
        let mut client = self.client_for(primary);
        client
            .get(Request::new(GetRequest { key }))
            .await
            .map_err(|source| Error::Transport {
                peer: primary.as_str().to_string(),
                source,
            })
    }

    async fn forward_put(&self, primary: &NodeId, req: PutRequest) -> Result<Response<PutResponse>> {
        let mut client = self.client_for(primary);
        client
            .put(Request::new(req))
            .await
            .map_err(|source| Error::Transport {
                peer: primary.as_str().to_string(),
                source,
            })
    }

    async fn replicate_put(&self, peer: &NodeId, key: String, value: String, ttl: i64) -> Result<()> {
        let mut client = self.client_for(peer);
        let req = PutRequest {
            key,
            value,
            ttl,
            is_replica: true,
        };
        client
            .put(Request::new(req))
            .await
            .map(|_| ())
            .map_err(|source| Error::Transport {
                peer: peer.as_str().to_string(),
                source,
            })
    }
}

#[tonic::async_trait]
impl CacheService for Arc<Node> {
    async fn get(&self, request: Request<GetRequest>) -> std::result::Result<Response<GetResponse>, Status> {
        let _permit = self
            .handler_slots
            .acquire()
            .await
            .expect("handler semaphore is never closed");
        let key = request.into_inner().key;
        let replicas = self.ring.replicas(key.as_bytes(), self.replication_factor);
        let plan = Plan::build(&replicas, &self.address).map_err(Error::from)?;

        match plan {
            Plan::Forward { primary } => Ok(self.forward_get(&primary, key).await?),
            Plan::Local { .. } => match self.cache.get(&key) {
                Some(value) => Ok(Response::new(GetResponse { success: true, value })),
                None => Err(Error::NotFound.into()),
            },
        }
    }

    async fn put(&self, request: Request<PutRequest>) -> std::result::Result<Response<PutResponse>, Status> {
        let _permit = self
            .handler_slots
            .acquire()
            .await
            .expect("handler semaphore is never closed");
        let req = request.into_inner();
        let replicas = self.ring.replicas(req.key.as_bytes(), self.replication_factor);
        let plan = Plan::build(&replicas, &self.address).map_err(Error::from)?;

        match plan {
            Plan::Forward { primary } => Ok(self.forward_put(&primary, req).await?),
            Plan::Local { fanout } => {
                self.write_queue.log_put(req.key.clone(), req.value.clone(), req.ttl);
                self.cache.put(req.key.clone(), req.value.clone(), req.ttl.max(0) as u64);

                if req.is_replica {
                    return Ok(Response::new(PutResponse { success: true }));
                }

                let futures = fanout.iter().map(|peer| {
                    self.replicate_put(peer, req.key.clone(), req.value.clone(), req.ttl)
                });
                let results = join_all(futures).await;
                let success = results.iter().all(Result::is_ok);
                for r in results {
                    if let Err(e) = r {
                        tracing::warn!(error = %e, "replication to peer failed");
                    }
                }
                Ok(Response::new(PutResponse { success }))
            }
        }
    }

    async fn remove(&self, request: Request<RemoveRequest>) -> std::result::Result<Response<RemoveResponse>, Status> {
        let _permit = self
            .handler_slots
            .acquire()
            .await
            .expect("handler semaphore is never closed");
        let key = request.into_inner().key;
        self.write_queue.log_remove(key.clone());
        self.cache.remove(&key);
        Ok(Response::new(RemoveResponse { success: true }))
    }
}
