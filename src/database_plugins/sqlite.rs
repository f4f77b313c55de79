// ABOUTME: SQLite database implementation of the DatabaseProvider trait
// ABOUTME: Holds the connection pool, schema migrations, and row mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! SQLite database implementation
//!
//! Timestamps are stored as RFC 3339 text; the tenant lookup columns
//! (slug, subdomain, custom domain) are unique and indexed because they
//! sit on the per-request resolution path.

use super::DatabaseProvider;
use crate::models::{ProviderIdentity, RoleGrant, Tenant, TenantId, User, UserRole};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TENANT_COLUMNS: &str = "id, name, slug, subdomain, custom_domain, is_active, \
     oauth_client_id, oauth_client_secret, guild_id, role_admin, role_evaluator, role_player, \
     created_at, updated_at";

const USER_COLUMNS: &str =
    "id, external_id, tenant_id, username, avatar, role, is_admin, created_at, last_synced_at";

/// SQLite database implementation
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Get a reference to the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_tenant(row: &SqliteRow) -> Result<Tenant> {
        Ok(Tenant {
            id: TenantId::from_uuid(parse_uuid_column(row, "id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            subdomain: row.try_get("subdomain")?,
            custom_domain: row.try_get("custom_domain")?,
            is_active: row.try_get("is_active")?,
            oauth_client_id: row.try_get("oauth_client_id")?,
            oauth_client_secret: row.try_get("oauth_client_secret")?,
            guild_id: row.try_get("guild_id")?,
            role_admin: row.try_get("role_admin")?,
            role_evaluator: row.try_get("role_evaluator")?,
            role_player: row.try_get("role_player")?,
            created_at: parse_timestamp_column(row, "created_at")?,
            updated_at: parse_timestamp_column(row, "updated_at")?,
        })
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: parse_uuid_column(row, "id")?,
            external_id: row.try_get("external_id")?,
            tenant_id: TenantId::from_uuid(parse_uuid_column(row, "tenant_id")?),
            username: row.try_get("username")?,
            avatar: row.try_get("avatar")?,
            role: UserRole::from_db_string(&role),
            is_admin: row.try_get("is_admin")?,
            created_at: parse_timestamp_column(row, "created_at")?,
            last_synced_at: parse_timestamp_column(row, "last_synced_at")?,
        })
    }

    async fn fetch_tenant_where(&self, column: &str, value: &str) -> Result<Option<Tenant>> {
        let query = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE {column} = ?");
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_tenant).transpose()
    }

    async fn fetch_user_by_external(
        &self,
        external_id: &str,
        tenant_id: TenantId,
    ) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ? AND tenant_id = ?");
        let row = sqlx::query(&query)
            .bind(external_id)
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl DatabaseProvider for SqliteDatabase {
    async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !in_memory {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        // An in-memory database exists per connection, so the pool must be
        // pinned to a single connection that never expires
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(&connection_options)
                .await
        } else {
            SqlitePool::connect(&connection_options).await
        }
        .with_context(|| format!("failed to open database at {database_url}"))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                subdomain TEXT UNIQUE NOT NULL,
                custom_domain TEXT UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                oauth_client_id TEXT,
                oauth_client_secret TEXT,
                guild_id TEXT,
                role_admin TEXT,
                role_evaluator TEXT,
                role_player TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tenants_slug ON tenants(slug)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tenants_subdomain ON tenants(subdomain)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tenants_custom_domain ON tenants(custom_domain)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                username TEXT NOT NULL,
                avatar TEXT,
                role TEXT NOT NULL DEFAULT 'PLAYER',
                is_admin BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_synced_at TEXT NOT NULL,
                UNIQUE(external_id, tenant_id),
                FOREIGN KEY(tenant_id) REFERENCES tenants(id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_external ON users(external_id, tenant_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_tenant(&self, tenant: &Tenant) -> Result<()> {
        let query = format!(
            "INSERT INTO tenants ({TENANT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(tenant.id.to_string())
            .bind(&tenant.name)
            .bind(&tenant.slug)
            .bind(&tenant.subdomain)
            .bind(&tenant.custom_domain)
            .bind(tenant.is_active)
            .bind(&tenant.oauth_client_id)
            .bind(&tenant.oauth_client_secret)
            .bind(&tenant.guild_id)
            .bind(&tenant.role_admin)
            .bind(&tenant.role_evaluator)
            .bind(&tenant.role_player)
            .bind(tenant.created_at.to_rfc3339())
            .bind(tenant.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_tenant(&self, tenant: &Tenant) -> Result<()> {
        let query = r"
            UPDATE tenants SET
                name = ?, slug = ?, subdomain = ?, custom_domain = ?, is_active = ?,
                oauth_client_id = ?, oauth_client_secret = ?, guild_id = ?,
                role_admin = ?, role_evaluator = ?, role_player = ?, updated_at = ?
            WHERE id = ?
        ";
        let result = sqlx::query(query)
            .bind(&tenant.name)
            .bind(&tenant.slug)
            .bind(&tenant.subdomain)
            .bind(&tenant.custom_domain)
            .bind(tenant.is_active)
            .bind(&tenant.oauth_client_id)
            .bind(&tenant.oauth_client_secret)
            .bind(&tenant.guild_id)
            .bind(&tenant.role_admin)
            .bind(&tenant.role_evaluator)
            .bind(&tenant.role_player)
            .bind(Utc::now().to_rfc3339())
            .bind(tenant.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("tenant {} not found", tenant.id));
        }
        Ok(())
    }

    async fn get_tenant_by_id(&self, tenant_id: TenantId) -> Result<Option<Tenant>> {
        self.fetch_tenant_where("id", &tenant_id.to_string()).await
    }

    async fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        self.fetch_tenant_where("slug", slug).await
    }

    async fn get_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>> {
        self.fetch_tenant_where("subdomain", subdomain).await
    }

    async fn get_tenant_by_custom_domain(&self, domain: &str) -> Result<Option<Tenant>> {
        self.fetch_tenant_where("custom_domain", domain).await
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let query = format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at DESC");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut tenants = Vec::with_capacity(rows.len());
        for row in &rows {
            tenants.push(Self::row_to_tenant(row)?);
        }
        Ok(tenants)
    }

    async fn set_tenant_active(&self, tenant_id: TenantId, is_active: bool) -> Result<()> {
        sqlx::query("UPDATE tenants SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now().to_rfc3339())
            .bind(tenant_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ensure_user(&self, identity: &ProviderIdentity, tenant_id: TenantId) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        // Creation defaults to PLAYER; an existing row keeps its stored role.
        let query = r"
            INSERT INTO users (id, external_id, tenant_id, username, avatar, role, is_admin, created_at, last_synced_at)
            VALUES (?, ?, ?, ?, ?, 'PLAYER', 0, ?, ?)
            ON CONFLICT(external_id, tenant_id) DO UPDATE SET
                username = excluded.username,
                avatar = excluded.avatar
        ";
        sqlx::query(query)
            .bind(Uuid::new_v4().to_string())
            .bind(&identity.id)
            .bind(tenant_id.to_string())
            .bind(&identity.username)
            .bind(&identity.avatar)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        self.fetch_user_by_external(&identity.id, tenant_id)
            .await?
            .ok_or_else(|| anyhow!("user upsert did not persist"))
    }

    async fn upsert_user_grant(
        &self,
        identity: &ProviderIdentity,
        tenant_id: TenantId,
        grant: RoleGrant,
    ) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let query = r"
            INSERT INTO users (id, external_id, tenant_id, username, avatar, role, is_admin, created_at, last_synced_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id, tenant_id) DO UPDATE SET
                username = excluded.username,
                avatar = excluded.avatar,
                role = excluded.role,
                is_admin = excluded.is_admin,
                last_synced_at = excluded.last_synced_at
        ";
        sqlx::query(query)
            .bind(Uuid::new_v4().to_string())
            .bind(&identity.id)
            .bind(tenant_id.to_string())
            .bind(&identity.username)
            .bind(&identity.avatar)
            .bind(grant.role.to_db_string())
            .bind(grant.is_admin)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        self.fetch_user_by_external(&identity.id, tenant_id)
            .await?
            .ok_or_else(|| anyhow!("user upsert did not persist"))
    }

    async fn get_user_by_external(
        &self,
        external_id: &str,
        tenant_id: TenantId,
    ) -> Result<Option<User>> {
        self.fetch_user_by_external(external_id, tenant_id).await
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&query)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }
}

fn parse_uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).with_context(|| format!("invalid uuid in column {column}: {raw}"))
}

fn parse_timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp in column {column}: {raw}"))
}
