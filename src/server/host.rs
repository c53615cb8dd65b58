//! Server host holding everything an exposure needs to build its router
//!
//! The host is assembled by [`ServerBuilder`](super::ServerBuilder) and is
//! independent of how the API is served.

use crate::config::{PaginationConfig, ServerConfig};
use crate::core::module::EntityFetcher;
use crate::server::entity_registry::{EntityRegistry, RouteContext};
use crate::server::resolver::ReferenceResolver;
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;

/// Host context containing all application state
///
/// # Example
///
/// ```rust,ignore
/// let host = ServerBuilder::new()
///     .register_module(BookkeepingModule::new(services))?
///     .build_host()?;
///
/// let app = RestExposure::build_router(Arc::new(host))?;
/// ```
pub struct ServerHost {
    /// Registry of every resource's CRUD descriptor
    pub entity_registry: EntityRegistry,

    /// Cross-resource lookups for reference checks and population
    pub resolver: Arc<ReferenceResolver>,

    /// Module and custom routes mounted under `/api` next to the CRUD routes
    pub api_routes: Vec<Router>,

    pub pagination: PaginationConfig,

    pub server: ServerConfig,
}

impl ServerHost {
    pub fn from_builder_components(
        entity_registry: EntityRegistry,
        fetchers: HashMap<String, Arc<dyn EntityFetcher>>,
        api_routes: Vec<Router>,
        pagination: PaginationConfig,
        server: ServerConfig,
    ) -> Self {
        Self {
            entity_registry,
            resolver: Arc::new(ReferenceResolver::new(fetchers)),
            api_routes,
            pagination,
            server,
        }
    }

    /// Context passed to each descriptor when building CRUD routes
    pub fn route_context(&self) -> RouteContext {
        RouteContext {
            resolver: self.resolver.clone(),
            pagination: self.pagination.clone(),
        }
    }

    /// Get resource types registered in the host
    pub fn entity_types(&self) -> Vec<&str> {
        self.entity_registry.entity_types()
    }

    /// A host is ready once at least one resource can be resolved
    pub fn is_ready(&self) -> bool {
        !self.resolver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_host() -> ServerHost {
        ServerHost::from_builder_components(
            EntityRegistry::new(),
            HashMap::new(),
            Vec::new(),
            PaginationConfig::default(),
            ServerConfig::default(),
        )
    }

    #[test]
    fn test_empty_host() {
        let host = empty_host();
        assert!(host.entity_types().is_empty());
        assert!(!host.is_ready());
    }

    #[test]
    fn test_route_context_carries_pagination() {
        let mut host = empty_host();
        host.pagination.max_limit = 7;
        assert_eq!(host.route_context().pagination.max_limit, 7);
    }
}
