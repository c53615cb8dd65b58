//! # PocketBooks
//!
//! Bookkeeping backend serving REST CRUD endpoints for clients, vendors,
//! assets, expenses, inventory, loans, payments and procurement.
//!
//! ## Features
//!
//! - **Generic CRUD**: one set of handlers serves every resource, with
//!   filtering, search, sorting, pagination and reference population
//! - **Declarative resources**: `impl_resource!` generates the record struct,
//!   its base fields and trait implementations
//! - **Soft delete**: records are hidden through `deletedAt` unless hard-deleted
//! - **Pluggable storage**: in-memory or MongoDB (feature `mongodb_backend`)
//! - **Reports**: inventory summary, asset depreciation, loan summaries and a
//!   dashboard
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pocketbooks::prelude::*;
//!
//! let config = AppConfig::load()?;
//! let storage = Storage::connect(&config.storage).await?;
//! let services = BookServices::connect(&storage).await?;
//!
//! ServerBuilder::new()
//!     .with_pagination(config.pagination.clone())
//!     .with_server_config(config.server.clone())
//!     .register_module(BookkeepingModule::new(services))?
//!     .serve(&config.server.addr)
//!     .await?;
//! ```

pub mod books;
pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        entity::{Entity, Lifecycle, Reference, Resource},
        error::BooksError,
        module::{EntityFetcher, Module, ServiceFetcher},
        query::{ListQuery, Page, PaginationMeta, SortDirection, SortSpec},
        response::ApiResponse,
        service::DataService,
    };

    // === Domain ===
    pub use crate::books::{BookServices, BookkeepingModule};

    // === Storage ===
    pub use crate::storage::{InMemoryDataService, Storage};

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{EntityDescriptor, EntityRegistry, RestExposure, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
