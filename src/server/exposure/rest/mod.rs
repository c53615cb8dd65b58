//! REST API exposure
//!
//! Consumes a `ServerHost` and produces the Axum `Router`: health checks at
//! the root, every resource and report under `/api`, a JSON 404 fallback,
//! request tracing and CORS.

use super::super::host::ServerHost;
use crate::config::ServerConfig;
use crate::core::error::BooksError;
use anyhow::{Context, Result};
use axum::extract::OriginalUri;
use axum::http::HeaderValue;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    pub fn build_router(host: Arc<ServerHost>) -> Result<Router> {
        let mut api = host.entity_registry.build_routes(&host.route_context());
        for routes in &host.api_routes {
            api = api.merge(routes.clone());
        }

        let app = Self::health_routes()
            .nest("/api", api)
            .fallback(Self::not_found)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(Self::cors_layer(&host.server)?),
            );

        Ok(app)
    }

    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "pocketbooks",
            "version": env!("CARGO_PKG_VERSION")
        }))
    }

    async fn not_found(OriginalUri(uri): OriginalUri) -> BooksError {
        BooksError::RouteNotFound(uri.path().to_string())
    }

    /// Any origin when none are configured, otherwise only the listed ones
    fn cors_layer(server: &ServerConfig) -> Result<CorsLayer> {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if server.cors_origins.is_empty() {
            return Ok(layer.allow_origin(Any));
        }

        let origins = server
            .cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin '{}'", origin))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(layer.allow_origin(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        let server = ServerConfig {
            cors_origins: vec!["http://localhost:5173".into(), "bad\norigin".into()],
            ..ServerConfig::default()
        };
        assert!(RestExposure::cors_layer(&server).is_err());

        let server = ServerConfig {
            cors_origins: vec!["http://localhost:5173".into()],
            ..ServerConfig::default()
        };
        assert!(RestExposure::cors_layer(&server).is_ok());
    }
}
