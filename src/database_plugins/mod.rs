// ABOUTME: Database abstraction layer for the Tribunal server
// ABOUTME: Plugin architecture with a SQLite backend behind a provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Database abstraction layer
//!
//! The tenant store is read-mostly: tenant records are looked up on every
//! request (by slug, subdomain, or custom domain) and written only by
//! platform operators. User writes are single-statement upserts keyed on
//! (`external_id`, `tenant_id`); last-writer-wins is the unit of atomicity.

use crate::models::{ProviderIdentity, RoleGrant, Tenant, TenantId, User};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Database factory with runtime backend selection
pub mod factory;
/// SQLite backend
pub mod sqlite;

/// Core database abstraction trait
///
/// All database implementations must implement this trait to provide
/// a consistent interface for the application layer.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + Clone {
    /// Create a new database connection
    async fn new(database_url: &str) -> Result<Self>
    where
        Self: Sized;

    /// Run database migrations to set up schema
    async fn migrate(&self) -> Result<()>;

    // ================================
    // Tenant Store
    // ================================

    /// Create a new tenant
    async fn create_tenant(&self, tenant: &Tenant) -> Result<()>;

    /// Update an existing tenant (operator edits)
    async fn update_tenant(&self, tenant: &Tenant) -> Result<()>;

    /// Get tenant by ID
    async fn get_tenant_by_id(&self, tenant_id: TenantId) -> Result<Option<Tenant>>;

    /// Get tenant by slug
    async fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>>;

    /// Get tenant by subdomain
    async fn get_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>>;

    /// Get tenant by custom domain (exact match)
    async fn get_tenant_by_custom_domain(&self, domain: &str) -> Result<Option<Tenant>>;

    /// List all tenants, newest first
    async fn list_tenants(&self) -> Result<Vec<Tenant>>;

    /// Soft-enable or soft-disable a tenant
    async fn set_tenant_active(&self, tenant_id: TenantId, is_active: bool) -> Result<()>;

    // ================================
    // User Management
    // ================================

    /// Ensure a user row exists for an external identity within a tenant
    ///
    /// Creates the row with the default `PLAYER` role if absent, otherwise
    /// refreshes username/avatar without touching the stored role. One
    /// atomic statement.
    async fn ensure_user(&self, identity: &ProviderIdentity, tenant_id: TenantId) -> Result<User>;

    /// Apply a role grant to a user, creating the row if needed
    ///
    /// One atomic upsert keyed on (`external_id`, `tenant_id`);
    /// last-writer-wins for concurrent syncs of the same pair.
    async fn upsert_user_grant(
        &self,
        identity: &ProviderIdentity,
        tenant_id: TenantId,
        grant: RoleGrant,
    ) -> Result<User>;

    /// Get user by external identity within a tenant
    async fn get_user_by_external(
        &self,
        external_id: &str,
        tenant_id: TenantId,
    ) -> Result<Option<User>>;

    /// Get user by internal ID
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Get total number of users
    async fn get_user_count(&self) -> Result<i64>;
}
