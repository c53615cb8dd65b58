//! Core module containing the traits and types shared by every resource

pub mod entity;
pub mod error;
pub mod module;
pub mod pluralize;
pub mod query;
pub mod response;
pub mod service;
pub mod timestamp;

pub use entity::{Entity, Lifecycle, Reference, Resource};
pub use error::BooksError;
pub use module::{EntityFetcher, Module};
pub use pluralize::Pluralizer;
pub use service::DataService;
