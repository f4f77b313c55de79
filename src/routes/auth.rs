// ABOUTME: OAuth handshake routes: login redirect, callback, logout, re-sync
// ABOUTME: Builds per-tenant auth options per request and issues session cookies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Authentication routes
//!
//! The handshake is tenant-scoped end to end: the tenant resolved at
//! `/auth/login` is pinned into the CSRF state and re-fetched at the
//! callback, so the code exchange always uses the credentials of the tenant
//! that initiated it. A tenant with an incomplete credential bundle fails
//! the handshake closed.

use crate::database_plugins::DatabaseProvider;
use crate::errors::AppError;
use crate::middleware::{require_authenticated, ExtractedClaims, ResolvedTenant, SESSION_COOKIE};
use crate::models::ProviderIdentity;
use crate::resources::{HandshakeState, ServerResources};
use axum::{
    extract::{Extension, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Query parameters of the OAuth callback
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: String,
    state: String,
}

/// Response after logout
#[derive(Serialize)]
struct LogoutResponse {
    success: bool,
}

/// Response after an explicit role re-sync
#[derive(Serialize)]
struct ResyncResponse {
    role: String,
    is_admin: bool,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/login", get(Self::handle_login))
            .route("/auth/callback", get(Self::handle_callback))
            .route("/auth/logout", post(Self::handle_logout))
            .route("/auth/resync", post(Self::handle_resync))
            .with_state(resources)
    }

    /// Start the OAuth handshake for the resolved tenant
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Extension(tenant): Extension<ResolvedTenant>,
    ) -> Result<Response, AppError> {
        // Fails closed when the tenant lacks credentials; no fallback to
        // another tenant's bundle
        let options = resources.auth_options.build(tenant.get())?;

        let state = Uuid::new_v4().to_string();
        resources
            .store_handshake_state(&state, HandshakeState::new(tenant.get().map(|t| t.id)))
            .await;

        let url = resources.auth_options.authorize_url(&options, &state);

        info!(
            tenant = tenant.get().map_or("platform-root", |t| t.slug.as_str()),
            "starting OAuth handshake"
        );

        Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
    }

    /// Complete the OAuth handshake: exchange, identify, sync, issue claims
    async fn handle_callback(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<CallbackParams>,
    ) -> Result<Response, AppError> {
        let handshake = resources
            .consume_handshake_state(&params.state)
            .await
            .ok_or_else(|| AppError::auth_invalid("unknown or expired OAuth state"))?;

        // Re-fetch the tenant pinned at handshake start; a tenant disabled
        // mid-handshake aborts the sign-in
        let tenant = match handshake.tenant_id {
            Some(tenant_id) => {
                let tenant = resources
                    .database
                    .get_tenant_by_id(tenant_id)
                    .await
                    .map_err(|e| AppError::database(format!("tenant lookup failed: {e}")))?
                    .filter(|t| t.is_active)
                    .ok_or_else(|| {
                        AppError::auth_invalid("tenant is no longer available for sign-in")
                    })?;
                Some(tenant)
            }
            None => None,
        };

        let options = resources.auth_options.build(tenant.as_ref())?;
        let access_token = resources
            .oauth_client
            .exchange_code(&options, &params.code)
            .await?;
        let identity = resources.oauth_client.fetch_identity(&access_token).await?;

        let claims = if let Some(tenant) = tenant {
            let user = resources
                .role_syncer
                .sync_from_provider(&identity, &tenant)
                .await?;
            resources
                .auth_manager
                .build_claims(&user, Some(&tenant), &resources.allow_list)?
        } else {
            resources
                .auth_manager
                .build_bootstrap_claims(&identity, &resources.allow_list)
        };

        let token = resources
            .auth_manager
            .generate_token(&claims)
            .map_err(|e| AppError::internal(format!("failed to sign session token: {e}")))?;

        info!(
            sub = %claims.sub,
            tenant_id = %claims.tenant_id,
            role = %claims.role,
            "sign-in completed"
        );

        Ok((
            StatusCode::FOUND,
            [
                (header::SET_COOKIE, Self::session_cookie(&resources, &token)),
                (header::LOCATION, "/".to_owned()),
            ],
        )
            .into_response())
    }

    /// Clear the session cookie
    async fn handle_logout(
        State(_resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        Ok((
            StatusCode::OK,
            [(header::SET_COOKIE, Self::clear_session_cookie())],
            Json(LogoutResponse { success: true }),
        )
            .into_response())
    }

    /// Explicit role re-sync for the signed-in user
    ///
    /// The only path besides sign-in that refreshes a session's role; a
    /// provider-side role change never downgrades a session implicitly.
    async fn handle_resync(
        State(resources): State<Arc<ServerResources>>,
        Extension(extracted): Extension<ExtractedClaims>,
    ) -> Result<Response, AppError> {
        let claims = require_authenticated(&extracted)?;

        if claims.tenant_id.is_nil() {
            return Err(AppError::invalid_input(
                "platform sessions carry no tenant roles to re-sync",
            ));
        }

        let tenant = resources
            .database
            .get_tenant_by_id(claims.tenant_id)
            .await
            .map_err(|e| AppError::database(format!("tenant lookup failed: {e}")))?
            .filter(|t| t.is_active)
            .ok_or_else(AppError::access_denied)?;

        let user = resources
            .database
            .get_user_by_external(&claims.sub, tenant.id)
            .await
            .map_err(|e| AppError::database(format!("user lookup failed: {e}")))?
            .ok_or_else(AppError::access_denied)?;

        let identity = ProviderIdentity {
            id: user.external_id.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        };

        let user = resources
            .role_syncer
            .sync_from_provider(&identity, &tenant)
            .await?;
        let new_claims =
            resources
                .auth_manager
                .build_claims(&user, Some(&tenant), &resources.allow_list)?;
        let token = resources
            .auth_manager
            .generate_token(&new_claims)
            .map_err(|e| AppError::internal(format!("failed to sign session token: {e}")))?;

        Ok((
            StatusCode::OK,
            [(header::SET_COOKIE, Self::session_cookie(&resources, &token))],
            Json(ResyncResponse {
                role: user.role.to_db_string().to_owned(),
                is_admin: user.is_admin,
            }),
        )
            .into_response())
    }

    /// Session cookie with the standard attributes
    ///
    /// HttpOnly prevents script access, SameSite=Lax prevents CSRF, and
    /// Max-Age matches the token expiry.
    fn session_cookie(resources: &ServerResources, token: &str) -> String {
        let max_age = resources.config.auth.session_expiry_hours * 3600;
        format!(
            "{SESSION_COOKIE}={token}; HttpOnly; Secure; Path=/; SameSite=Lax; Max-Age={max_age}"
        )
    }

    /// Clearing session cookie
    fn clear_session_cookie() -> String {
        format!("{SESSION_COOKIE}=; HttpOnly; Secure; Path=/; SameSite=Lax; Max-Age=0")
    }
}
