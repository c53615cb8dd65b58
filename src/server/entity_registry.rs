//! Entity registry for managing resource descriptors and auto-generating CRUD routes

use crate::config::PaginationConfig;
use crate::core::entity::Resource;
use crate::core::service::DataService;
use crate::server::handlers::{
    ResourceState, handle_create, handle_delete, handle_get_all, handle_get_by_id, handle_update,
};
use crate::server::resolver::ReferenceResolver;
use axum::Router;
use axum::routing::get;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared state every descriptor needs when building its routes
#[derive(Clone)]
pub struct RouteContext {
    pub resolver: Arc<ReferenceResolver>,
    pub pagination: PaginationConfig,
}

/// Trait that describes how to build routes for a resource
pub trait EntityDescriptor: Send + Sync {
    /// The resource type name (singular, e.g., "raw_material")
    fn entity_type(&self) -> &str;

    /// The plural form (e.g., "raw_materials")
    fn plural(&self) -> &str;

    /// Build the CRUD routes for this resource, relative to `/api`
    fn build_routes(&self, ctx: &RouteContext) -> Router;
}

/// [`EntityDescriptor`] wiring a [`DataService`] to the generic handlers
pub struct ResourceDescriptor<T: Resource> {
    service: Arc<dyn DataService<T>>,
}

impl<T: Resource> ResourceDescriptor<T> {
    pub fn new(service: Arc<dyn DataService<T>>) -> Self {
        Self { service }
    }
}

impl<T: Resource> EntityDescriptor for ResourceDescriptor<T> {
    fn entity_type(&self) -> &str {
        T::resource_name_singular()
    }

    fn plural(&self) -> &str {
        T::resource_name()
    }

    fn build_routes(&self, ctx: &RouteContext) -> Router {
        let state = ResourceState {
            service: self.service.clone(),
            resolver: ctx.resolver.clone(),
            pagination: ctx.pagination.clone(),
        };
        let collection = format!("/{}", T::route_segment());
        let item = format!("{}/{{id}}", collection);

        Router::new()
            .route(
                &collection,
                get(handle_get_all::<T>).post(handle_create::<T>),
            )
            .route(
                &item,
                get(handle_get_by_id::<T>)
                    .put(handle_update::<T>)
                    .delete(handle_delete::<T>),
            )
            .with_state(state)
    }
}

/// Registry for all resources in the application
///
/// Descriptors are collected from every registered module; the registry then
/// merges their routers.
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one for the same type
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        if self.descriptors.insert(entity_type.clone(), descriptor).is_some() {
            tracing::warn!(entity_type = %entity_type, "entity descriptor registered twice");
        }
    }

    /// Build a router with all registered resource routes
    pub fn build_routes(&self, ctx: &RouteContext) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, descriptor| {
                tracing::debug!(
                    entity_type = descriptor.entity_type(),
                    collection = descriptor.plural(),
                    "mounting CRUD routes"
                );
                router.merge(descriptor.build_routes(ctx))
            })
    }

    /// All registered resource types, in name order
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }
}
