//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::EntityRegistry;
use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::{PaginationConfig, ServerConfig};
use crate::core::module::{EntityFetcher, Module};
use anyhow::Result;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers with auto-registered routes
///
/// # Example
///
/// ```ignore
/// let services = BookServices::connect(&storage).await?;
///
/// ServerBuilder::new()
///     .with_pagination(config.pagination.clone())
///     .with_server_config(config.server.clone())
///     .register_module(BookkeepingModule::new(services))?
///     .serve(&config.server.addr)
///     .await?;
/// ```
pub struct ServerBuilder {
    entity_registry: EntityRegistry,
    modules: Vec<Arc<dyn Module>>,
    custom_routes: Vec<Router>,
    pagination: PaginationConfig,
    server: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            entity_registry: EntityRegistry::new(),
            modules: Vec::new(),
            custom_routes: Vec::new(),
            pagination: PaginationConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Server settings used by the exposure (CORS origins)
    pub fn with_server_config(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Add routes that don't fit the CRUD pattern; they are mounted under `/api`
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register a module
    ///
    /// This will:
    /// 1. Register all resources from the module
    /// 2. Collect the module's extra routes
    /// 3. Store the module for entity fetching
    pub fn register_module(mut self, module: impl Module + 'static) -> Result<Self> {
        let module = Arc::new(module);

        module.register_entities(&mut self.entity_registry);
        self.custom_routes.push(module.routes()?);

        tracing::info!(
            module = module.name(),
            version = module.version(),
            entities = module.entity_types().len(),
            "registered module"
        );
        self.modules.push(module);

        Ok(self)
    }

    /// Build the transport-agnostic host
    pub fn build_host(self) -> Result<ServerHost> {
        let mut fetchers: HashMap<String, Arc<dyn EntityFetcher>> = HashMap::new();
        for module in &self.modules {
            for entity_type in module.entity_types() {
                if let Some(fetcher) = module.get_entity_fetcher(entity_type) {
                    fetchers.insert(entity_type.to_string(), fetcher);
                }
            }
        }

        Ok(ServerHost::from_builder_components(
            self.entity_registry,
            fetchers,
            self.custom_routes,
            self.pagination,
            self.server,
        ))
    }

    /// Build the final REST router
    pub fn build(self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);
        RestExposure::build_router(host)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
