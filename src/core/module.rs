//! Module system for PocketBooks
//!
//! A module bundles a set of resources, registers their CRUD routes and
//! exposes fetchers so other resources can populate references to them.

use crate::core::entity::Resource;
use crate::core::service::DataService;
use crate::server::entity_registry::EntityRegistry;
use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for fetching records dynamically
///
/// This allows the reference resolver to embed referenced records
/// without knowing the concrete types at compile time.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// Fetch a non-deleted record by ID as JSON
    async fn fetch_as_json(&self, entity_id: &Uuid) -> Result<Option<serde_json::Value>>;
}

/// [`EntityFetcher`] backed by a typed [`DataService`]
pub struct ServiceFetcher<T: Resource> {
    service: Arc<dyn DataService<T>>,
}

impl<T: Resource> ServiceFetcher<T> {
    pub fn new(service: Arc<dyn DataService<T>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<T: Resource> EntityFetcher for ServiceFetcher<T> {
    async fn fetch_as_json(&self, entity_id: &Uuid) -> Result<Option<serde_json::Value>> {
        match self.service.get(entity_id).await? {
            Some(entity) if !entity.is_deleted() => Ok(Some(serde_json::to_value(entity)?)),
            _ => Ok(None),
        }
    }
}

/// Trait for a service module
pub trait Module: Send + Sync {
    /// Unique module name
    fn name(&self) -> &str;

    /// Module version
    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Singular names of the resources managed by this module
    fn entity_types(&self) -> Vec<&str>;

    /// Register a descriptor for each resource with the entity registry
    fn register_entities(&self, registry: &mut EntityRegistry);

    /// Get a fetcher for a specific resource type, or `None` if this module doesn't own it
    fn get_entity_fetcher(&self, entity_type: &str) -> Option<Arc<dyn EntityFetcher>>;

    /// Routes that don't fit the CRUD pattern (reports, summaries)
    fn routes(&self) -> Result<Router> {
        Ok(Router::new())
    }
}
