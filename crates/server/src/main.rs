//! shellcache MCP server entry point.
//!
//! Boots the caching proxy worker and serves it over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchClient, FetchConfig, ProxyWorker};
use shellcache_core::{AppConfig, CacheDb, ProxySettings};
use tracing_subscriber::EnvFilter;

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
    let settings = ProxySettings::from_config(&config)?;

    tracing::info!(
        cache_name = %settings.cache_name(),
        db_path = %config.db_path.display(),
        "Starting shellcache server on stdio transport"
    );

    let cache = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config))?);
    let proxy = ProxyWorker::new(settings.clone(), cache.clone(), network).await?.spawn();

    let handler = handler::ShellcacheServer::new(proxy.clone(), cache, settings);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    proxy.shutdown().await?;

    Ok(())
}
