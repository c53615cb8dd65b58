//! PocketBooks server
//!
//! Loads configuration, connects the configured storage backend and serves
//! the bookkeeping API until Ctrl+C or SIGTERM.

use anyhow::Result;
use pocketbooks::books::{BookServices, BookkeepingModule};
use pocketbooks::config::AppConfig;
use pocketbooks::core::module::Module;
use pocketbooks::server::ServerBuilder;
use pocketbooks::storage::Storage;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))?,
        )
        .init();

    let storage = Storage::connect(&config.storage).await?;
    let services = BookServices::connect(&storage).await?;
    let module = BookkeepingModule::new(services);

    tracing::info!(
        module = module.name(),
        version = module.version(),
        backend = ?config.storage.backend,
        "starting PocketBooks"
    );

    ServerBuilder::new()
        .with_pagination(config.pagination.clone())
        .with_server_config(config.server.clone())
        .register_module(module)?
        .serve(&config.server.addr)
        .await
}
