//! warden server entry point.
//!
//! Loads configuration, opens the cache storage and boots the MCP server on
//! stdio transport. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use warden_client::{FetchClient, FetchConfig, ServiceWorker, WorkerConfig};
use warden_core::{AppConfig, CacheDb, LoadWatch};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(
        origin = %config.origin,
        cache = %config.cache_name,
        db = %config.db_path.display(),
        "Starting warden server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(ServiceWorker::open(WorkerConfig::try_from(&config)?, db, network).await?);

    let handler = handler::WardenServer::new(worker, LoadWatch::new(config.load_fallback()), &config.game_path);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
