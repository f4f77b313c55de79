// ABOUTME: Middleware resolving the active tenant for every request
// ABOUTME: Injects ResolvedTenant into request extensions after the claims layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Tenant context middleware
//!
//! Runs after session claims extraction. Reads the host header and the
//! masquerade override cookie, then delegates to the resolver. A request
//! that matches no tenant proceeds with `ResolvedTenant(None)` - the
//! platform root; route guards decide whether that is acceptable.

use crate::middleware::auth::{get_cookie_value, ExtractedClaims};
use crate::models::Tenant;
use crate::resources::ServerResources;
use crate::tenant::{MasqueradeOverride, MASQUERADE_COOKIE};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Resolved tenant wrapper for request extensions
#[derive(Debug, Clone)]
pub struct ResolvedTenant(pub Option<Tenant>);

impl ResolvedTenant {
    /// Get the tenant if one resolved
    #[must_use]
    pub const fn get(&self) -> Option<&Tenant> {
        self.0.as_ref()
    }
}

/// Tenant context middleware
///
/// Resolution precedence is handled entirely by the resolver: masquerade
/// override (super-admin only), then custom domain, then subdomain.
pub async fn tenant_context_middleware(
    State(resources): State<Arc<ServerResources>>,
    mut req: Request,
    next: Next,
) -> Response {
    let headers = req.headers();

    let host = headers
        .get("host")
        .and_then(|h| h.to_str().ok())
        .map(ToOwned::to_owned);

    let override_cookie = get_cookie_value(headers, MASQUERADE_COOKIE)
        .and_then(|value| MasqueradeOverride::from_cookie_value(&value));

    let claims = req
        .extensions()
        .get::<ExtractedClaims>()
        .cloned()
        .unwrap_or(ExtractedClaims(None));

    let tenant = match resources
        .resolver
        .resolve(host.as_deref(), override_cookie.as_ref(), claims.get())
        .await
    {
        Ok(tenant) => tenant,
        Err(e) => {
            // Store failures must not take the whole request down; the
            // request proceeds without tenant context and guards deny
            // anything privileged.
            warn!(error = %e, "tenant resolution failed, proceeding without tenant context");
            None
        }
    };

    if let Some(ref tenant) = tenant {
        tracing::Span::current().record("tenant_slug", tenant.slug.as_str());
    }

    req.extensions_mut().insert(ResolvedTenant(tenant));
    next.run(req).await
}
