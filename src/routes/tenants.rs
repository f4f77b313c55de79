// ABOUTME: Operator-facing tenant administration routes
// ABOUTME: Create, list, and update tenant records including OAuth credential bundles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Tenant administration routes
//!
//! Platform operators (super-admins) manage the tenant registry here. End
//! users never touch these endpoints. Responses never echo client secrets.

use crate::database_plugins::DatabaseProvider;
use crate::errors::AppError;
use crate::middleware::{require_super_admin, ExtractedClaims};
use crate::models::{Tenant, TenantId};
use crate::resources::ServerResources;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Request body for creating a tenant
#[derive(Debug, Deserialize)]
struct CreateTenantRequest {
    name: String,
    slug: String,
    subdomain: String,
    custom_domain: Option<String>,
    oauth_client_id: Option<String>,
    oauth_client_secret: Option<String>,
    guild_id: Option<String>,
    role_admin: Option<String>,
    role_evaluator: Option<String>,
    role_player: Option<String>,
}

/// Request body for updating a tenant; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
struct UpdateTenantRequest {
    name: Option<String>,
    custom_domain: Option<String>,
    is_active: Option<bool>,
    oauth_client_id: Option<String>,
    oauth_client_secret: Option<String>,
    guild_id: Option<String>,
    role_admin: Option<String>,
    role_evaluator: Option<String>,
    role_player: Option<String>,
}

/// Tenant summary for operator listings; never includes the client secret
#[derive(Serialize)]
struct TenantSummary {
    id: String,
    name: String,
    slug: String,
    subdomain: String,
    custom_domain: Option<String>,
    is_active: bool,
    has_oauth_credentials: bool,
    guild_id: Option<String>,
    role_admin: Option<String>,
    role_evaluator: Option<String>,
    role_player: Option<String>,
}

impl From<&Tenant> for TenantSummary {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id.to_string(),
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            subdomain: tenant.subdomain.clone(),
            custom_domain: tenant.custom_domain.clone(),
            is_active: tenant.is_active,
            has_oauth_credentials: tenant.has_oauth_credentials(),
            guild_id: tenant.guild_id.clone(),
            role_admin: tenant.role_admin.clone(),
            role_evaluator: tenant.role_evaluator.clone(),
            role_player: tenant.role_player.clone(),
        }
    }
}

/// Response listing tenants
#[derive(Serialize)]
struct TenantListResponse {
    tenants: Vec<TenantSummary>,
    total_count: usize,
}

/// Tenant administration routes - super-admin only
pub struct TenantAdminRoutes;

impl TenantAdminRoutes {
    /// Create all tenant administration routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/tenants", post(Self::handle_create_tenant))
            .route("/api/admin/tenants", get(Self::handle_list_tenants))
            .route("/api/admin/tenants/:tenant_id", put(Self::handle_update_tenant))
            .with_state(resources)
    }

    /// Create a new tenant
    async fn handle_create_tenant(
        State(resources): State<Arc<ServerResources>>,
        Extension(extracted): Extension<ExtractedClaims>,
        Json(request): Json<CreateTenantRequest>,
    ) -> Result<Response, AppError> {
        let claims = require_super_admin(&extracted)?;

        let slug = request.slug.trim().to_lowercase();
        let subdomain = request.subdomain.trim().to_lowercase();
        if slug.is_empty() || subdomain.is_empty() {
            return Err(AppError::invalid_input("slug and subdomain are required"));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::invalid_input(
                "slug may only contain letters, digits, '-' and '_'",
            ));
        }

        let mut tenant = Tenant::new(request.name, slug, subdomain);
        tenant.custom_domain = request.custom_domain.filter(|d| !d.is_empty());
        tenant.oauth_client_id = request.oauth_client_id.filter(|v| !v.is_empty());
        tenant.oauth_client_secret = request.oauth_client_secret.filter(|v| !v.is_empty());
        tenant.guild_id = request.guild_id.filter(|v| !v.is_empty());
        tenant.role_admin = request.role_admin;
        tenant.role_evaluator = request.role_evaluator;
        tenant.role_player = request.role_player;

        resources.database.create_tenant(&tenant).await.map_err(|e| {
            AppError::database(format!("tenant creation failed: {e}"))
                .with_resource_id(tenant.slug.clone())
        })?;

        info!(
            operator = %claims.sub,
            slug = %tenant.slug,
            "tenant created"
        );

        Ok((StatusCode::CREATED, Json(TenantSummary::from(&tenant))).into_response())
    }

    /// List all tenants
    async fn handle_list_tenants(
        State(resources): State<Arc<ServerResources>>,
        Extension(extracted): Extension<ExtractedClaims>,
    ) -> Result<Response, AppError> {
        require_super_admin(&extracted)?;

        let tenants = resources
            .database
            .list_tenants()
            .await
            .map_err(|e| AppError::database(format!("tenant listing failed: {e}")))?;

        let summaries: Vec<TenantSummary> = tenants.iter().map(TenantSummary::from).collect();
        let total_count = summaries.len();

        Ok((
            StatusCode::OK,
            Json(TenantListResponse {
                tenants: summaries,
                total_count,
            }),
        )
            .into_response())
    }

    /// Update an existing tenant (operator edits)
    async fn handle_update_tenant(
        State(resources): State<Arc<ServerResources>>,
        Extension(extracted): Extension<ExtractedClaims>,
        Path(tenant_id): Path<String>,
        Json(request): Json<UpdateTenantRequest>,
    ) -> Result<Response, AppError> {
        let claims = require_super_admin(&extracted)?;

        let tenant_id: TenantId = tenant_id
            .parse()
            .map_err(|_| AppError::invalid_input("invalid tenant id"))?;

        let mut tenant = resources
            .database
            .get_tenant_by_id(tenant_id)
            .await
            .map_err(|e| AppError::database(format!("tenant lookup failed: {e}")))?
            .ok_or_else(|| AppError::not_found("Tenant"))?;

        if let Some(name) = request.name {
            tenant.name = name;
        }
        if let Some(domain) = request.custom_domain {
            tenant.custom_domain = (!domain.is_empty()).then_some(domain);
        }
        if let Some(is_active) = request.is_active {
            tenant.is_active = is_active;
        }
        if let Some(client_id) = request.oauth_client_id {
            tenant.oauth_client_id = (!client_id.is_empty()).then_some(client_id);
        }
        if let Some(client_secret) = request.oauth_client_secret {
            tenant.oauth_client_secret = (!client_secret.is_empty()).then_some(client_secret);
        }
        if let Some(guild_id) = request.guild_id {
            tenant.guild_id = (!guild_id.is_empty()).then_some(guild_id);
        }
        if let Some(role_admin) = request.role_admin {
            tenant.role_admin = Some(role_admin);
        }
        if let Some(role_evaluator) = request.role_evaluator {
            tenant.role_evaluator = Some(role_evaluator);
        }
        if let Some(role_player) = request.role_player {
            tenant.role_player = Some(role_player);
        }

        resources
            .database
            .update_tenant(&tenant)
            .await
            .map_err(|e| AppError::database(format!("tenant update failed: {e}")))?;

        info!(
            operator = %claims.sub,
            slug = %tenant.slug,
            "tenant updated"
        );

        Ok((StatusCode::OK, Json(TenantSummary::from(&tenant))).into_response())
    }
}
