// ABOUTME: HTTP route assembly and middleware layering for the server
// ABOUTME: Merges auth, masquerade, and tenant admin routers behind shared layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! HTTP routes
//!
//! Layer order matters: session claims extraction runs first, then tenant
//! resolution (which needs the claims for the masquerade override), then
//! the route handlers.

/// OAuth handshake routes
pub mod auth;
/// Super-admin masquerade routes
pub mod masquerade;
/// Operator tenant administration routes
pub mod tenants;

pub use auth::AuthRoutes;
pub use masquerade::MasqueradeRoutes;
pub use tenants::TenantAdminRoutes;

use crate::middleware::{session_claims_middleware, tenant_context_middleware};
use crate::resources::ServerResources;
use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(MasqueradeRoutes::routes(Arc::clone(&resources)))
        .merge(TenantAdminRoutes::routes(Arc::clone(&resources)))
        // Innermost layer runs last: tenant resolution consumes the claims
        // extension injected by the session layer
        .layer(middleware::from_fn_with_state(
            Arc::clone(&resources),
            tenant_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            resources,
            session_claims_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
