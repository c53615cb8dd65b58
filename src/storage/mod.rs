//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

pub use in_memory::InMemoryDataService;
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoDataService;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::entity::Resource;
use crate::core::service::DataService;
use anyhow::Result;
use std::sync::Arc;

/// Handle to the configured backend, handing out one typed service per resource
#[derive(Clone)]
pub enum Storage {
    InMemory,
    #[cfg(feature = "mongodb_backend")]
    Mongo(::mongodb::Database),
}

impl Storage {
    /// Open the backend described by the configuration.
    ///
    /// For MongoDB the connection is verified with a `ping` before returning.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Memory => {
                tracing::info!("using in-memory storage");
                Ok(Storage::InMemory)
            }
            #[cfg(feature = "mongodb_backend")]
            StorageBackend::Mongodb => {
                let client = ::mongodb::Client::with_uri_str(&config.uri).await?;
                let database = client.database(&config.database);
                database
                    .run_command(::mongodb::bson::doc! { "ping": 1 })
                    .await?;
                tracing::info!(database = %config.database, "connected to MongoDB");
                Ok(Storage::Mongo(database))
            }
            #[cfg(not(feature = "mongodb_backend"))]
            StorageBackend::Mongodb => {
                anyhow::bail!("MongoDB storage requested but the `mongodb_backend` feature is disabled")
            }
        }
    }

    /// Create the data service for resource `T`, preparing indexes when needed
    pub async fn service<T: Resource>(&self) -> Result<Arc<dyn DataService<T>>> {
        match self {
            Storage::InMemory => Ok(Arc::new(InMemoryDataService::<T>::new())),
            #[cfg(feature = "mongodb_backend")]
            Storage::Mongo(database) => {
                let service = MongoDataService::<T>::new(database.clone());
                service.ensure_indexes().await?;
                Ok(Arc::new(service))
            }
        }
    }
}
