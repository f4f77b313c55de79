// ABOUTME: Database factory and provider abstraction for backend selection
// ABOUTME: Provides a unified interface with runtime database type detection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Database factory for creating database providers
//!
//! This module provides automatic database type detection and creation
//! based on connection strings.

use super::sqlite::SqliteDatabase;
use super::DatabaseProvider;
use crate::models::{ProviderIdentity, RoleGrant, Tenant, TenantId, User};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// Embedded SQLite backend
    SQLite,
}

/// Database instance wrapper that delegates to the appropriate implementation
#[derive(Clone)]
pub enum Database {
    /// SQLite backend
    SQLite(SqliteDatabase),
}

impl Database {
    /// Get a descriptive string for the current database backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::SQLite(_) => "SQLite",
        }
    }

    /// Get the database type enum
    #[must_use]
    pub const fn database_type(&self) -> DatabaseType {
        match self {
            Self::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

/// Automatically detect database type from connection string
///
/// # Errors
///
/// Returns an error if the URL format is not recognized (must start with
/// `sqlite:`).
pub fn detect_database_type(database_url: &str) -> Result<DatabaseType> {
    if database_url.starts_with("sqlite:") {
        Ok(DatabaseType::SQLite)
    } else {
        Err(anyhow!(
            "Unsupported database URL format: {database_url}. \
             Supported formats: sqlite:path/to/db.sqlite, sqlite::memory:"
        ))
    }
}

#[async_trait]
impl DatabaseProvider for Database {
    async fn new(database_url: &str) -> Result<Self> {
        debug!("Detecting database type from URL: {}", database_url);
        let db_type = detect_database_type(database_url)?;

        match db_type {
            DatabaseType::SQLite => {
                let db = SqliteDatabase::new(database_url).await?;
                info!("SQLite database initialized successfully");
                Ok(Self::SQLite(db))
            }
        }
    }

    async fn migrate(&self) -> Result<()> {
        match self {
            Self::SQLite(db) => db.migrate().await,
        }
    }

    async fn create_tenant(&self, tenant: &Tenant) -> Result<()> {
        match self {
            Self::SQLite(db) => db.create_tenant(tenant).await,
        }
    }

    async fn update_tenant(&self, tenant: &Tenant) -> Result<()> {
        match self {
            Self::SQLite(db) => db.update_tenant(tenant).await,
        }
    }

    async fn get_tenant_by_id(&self, tenant_id: TenantId) -> Result<Option<Tenant>> {
        match self {
            Self::SQLite(db) => db.get_tenant_by_id(tenant_id).await,
        }
    }

    async fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        match self {
            Self::SQLite(db) => db.get_tenant_by_slug(slug).await,
        }
    }

    async fn get_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>> {
        match self {
            Self::SQLite(db) => db.get_tenant_by_subdomain(subdomain).await,
        }
    }

    async fn get_tenant_by_custom_domain(&self, domain: &str) -> Result<Option<Tenant>> {
        match self {
            Self::SQLite(db) => db.get_tenant_by_custom_domain(domain).await,
        }
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        match self {
            Self::SQLite(db) => db.list_tenants().await,
        }
    }

    async fn set_tenant_active(&self, tenant_id: TenantId, is_active: bool) -> Result<()> {
        match self {
            Self::SQLite(db) => db.set_tenant_active(tenant_id, is_active).await,
        }
    }

    async fn ensure_user(&self, identity: &ProviderIdentity, tenant_id: TenantId) -> Result<User> {
        match self {
            Self::SQLite(db) => db.ensure_user(identity, tenant_id).await,
        }
    }

    async fn upsert_user_grant(
        &self,
        identity: &ProviderIdentity,
        tenant_id: TenantId,
        grant: RoleGrant,
    ) -> Result<User> {
        match self {
            Self::SQLite(db) => db.upsert_user_grant(identity, tenant_id, grant).await,
        }
    }

    async fn get_user_by_external(
        &self,
        external_id: &str,
        tenant_id: TenantId,
    ) -> Result<Option<User>> {
        match self {
            Self::SQLite(db) => db.get_user_by_external(external_id, tenant_id).await,
        }
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        match self {
            Self::SQLite(db) => db.get_user(user_id).await,
        }
    }

    async fn get_user_count(&self) -> Result<i64> {
        match self {
            Self::SQLite(db) => db.get_user_count().await,
        }
    }
}
