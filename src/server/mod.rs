//! Server module for building HTTP servers with auto-registered routes
//!
//! `ServerBuilder` collects modules, registers the CRUD routes of every
//! resource they declare, and exposes the result over REST.

pub mod builder;
pub mod entity_registry;
pub mod exposure;
pub mod handlers;
pub mod host;
pub mod resolver;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry, ResourceDescriptor, RouteContext};
pub use exposure::RestExposure;
pub use host::ServerHost;
pub use resolver::ReferenceResolver;
