//! regcount server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use regcount_client::{EcfrClient, FetchConfig, WordCountService};
use regcount_core::{AppConfig, JsonDirectory, PersistentCache};

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
    tracing::info!(base_url = %config.base_url, cache = %config.cache_path.display(), "Starting regcount server on stdio transport");

    let fetcher = EcfrClient::new(FetchConfig::from(&config))?;
    let directory = match JsonDirectory::load(&config.directory_path).await {
        Ok(directory) => directory,
        Err(e) => {
            tracing::warn!(error = %e, path = %config.directory_path.display(), "organization directory unavailable, organization lookups will fail");
            JsonDirectory::default()
        }
    };
    let cache = PersistentCache::open(&config.cache_path, config.cache_options()).await;

    let service = Arc::new(
        WordCountService::new(Arc::new(fetcher), Arc::new(directory), cache)
            .with_request_delay(config.request_delay()),
    );

    let handler = handler::RegCountServer::new(service.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    service.close().await?;
    tracing::info!("regcount server stopped");

    Ok(())
}
