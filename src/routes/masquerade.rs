// ABOUTME: Operator-facing tenant switch endpoint for super-admin masquerade
// ABOUTME: Sets or clears the override cookie without touching session claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Masquerade routes
//!
//! `POST /api/admin/tenant-switch` with `{ "slug": "acme" }` enters
//! masquerade; `{ "slug": null }` exits. Both are gated on the platform
//! super-admin flag and operate purely on the override cookie - the
//! super-admin's own claims, role, and tenant binding are never mutated,
//! which keeps the underlying identity auditable.

use crate::errors::AppError;
use crate::middleware::{get_cookie_value, require_super_admin, ExtractedClaims};
use crate::resources::ServerResources;
use crate::tenant::{MasqueradeController, MasqueradeOverride, MasqueradeState, MASQUERADE_COOKIE};
use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for the tenant switch endpoint
#[derive(Debug, Deserialize)]
struct TenantSwitchRequest {
    /// Target tenant slug; `null` clears the override
    slug: Option<String>,
}

/// Response describing the masquerade state after the switch
#[derive(Serialize)]
struct TenantSwitchResponse {
    masquerading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_slug: Option<String>,
}

/// Masquerade routes - super-admin only
pub struct MasqueradeRoutes;

impl MasqueradeRoutes {
    /// Create all masquerade routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/tenant-switch", post(Self::handle_switch))
            .route("/api/admin/tenant-switch", get(Self::handle_state))
            .with_state(resources)
    }

    /// Enter or exit masquerade
    async fn handle_switch(
        State(resources): State<Arc<ServerResources>>,
        Extension(extracted): Extension<ExtractedClaims>,
        Json(request): Json<TenantSwitchRequest>,
    ) -> Result<Response, AppError> {
        // The guard precedes any effect; non-super-admins get the uniform
        // denial regardless of body content
        let claims = require_super_admin(&extracted)?;

        match request.slug {
            Some(slug) => {
                let cookie = resources.masquerade.enter(Some(claims), &slug).await?;
                Ok((
                    StatusCode::OK,
                    [(header::SET_COOKIE, cookie)],
                    Json(TenantSwitchResponse {
                        masquerading: true,
                        target_slug: Some(slug),
                    }),
                )
                    .into_response())
            }
            None => {
                let cookie = MasqueradeController::exit(Some(claims))?;
                Ok((
                    StatusCode::OK,
                    [(header::SET_COOKIE, cookie)],
                    Json(TenantSwitchResponse {
                        masquerading: false,
                        target_slug: None,
                    }),
                )
                    .into_response())
            }
        }
    }

    /// Report the current masquerade state
    async fn handle_state(
        Extension(extracted): Extension<ExtractedClaims>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        require_super_admin(&extracted)?;

        let override_cookie = get_cookie_value(&headers, MASQUERADE_COOKIE)
            .and_then(|value| MasqueradeOverride::from_cookie_value(&value));

        let response = match MasqueradeState::of(override_cookie.as_ref()) {
            MasqueradeState::Direct => TenantSwitchResponse {
                masquerading: false,
                target_slug: None,
            },
            MasqueradeState::Masquerading(slug) => TenantSwitchResponse {
                masquerading: true,
                target_slug: Some(slug),
            },
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
