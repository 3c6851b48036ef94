//! `node <address> <peer1> [<peer2> ...]` (§6 CLI contract).
//!
//! Grounded in `examples/original_source/main.cpp`: construct a node,
//! start it, block until stdin yields a line, then stop gracefully. Exit
//! 1 on argument error or a start-up exception, matching the original's
//! `try { ... } catch (...) { return 1; }` wrapped around the whole
//! program.

use std::io::BufRead;

use clap::Parser;

use cachering_cli::Cli;
use cachering_node::Node;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
        )
        .init();

    let config = cli.into_node_config();
    let address = config.address.clone();

    let node = Node::new(config)?;
    node.start().await?;
    tracing::info!(%address, "node is serving, press enter on stdin to stop");

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    })
    .await?;

    node.stop().await;
    Ok(())
}
