//! Service trait for resource persistence

use crate::core::entity::Resource;
use crate::core::query::{ListQuery, Page};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Service trait for managing one resource type
///
/// Implementations provide CRUD operations for a specific record type.
/// The CRUD helpers are agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Resource>: Send + Sync {
    /// Insert a new record
    async fn create(&self, entity: T) -> Result<T>;

    /// Get a record by ID, soft-deleted or not
    async fn get(&self, id: &Uuid) -> Result<Option<T>>;

    /// List one page of records matching the query
    async fn list(&self, query: &ListQuery) -> Result<Page<T>>;

    /// Replace an existing record. Fails if the record does not exist.
    async fn update(&self, id: &Uuid, entity: T) -> Result<T>;

    /// Remove a record permanently. Returns whether anything was removed.
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    /// Records whose `field` equals `value` exactly, soft-deleted ones included
    async fn find_by_field(&self, field: &str, value: &serde_json::Value) -> Result<Vec<T>>;

    /// Every non-deleted record, for aggregation
    async fn all(&self) -> Result<Vec<T>>;
}
