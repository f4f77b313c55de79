// ABOUTME: Core data models for the multi-tenant tribunal platform
// ABOUTME: Defines Tenant, User, UserRole, TenantId and role grant types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! # Data Models
//!
//! Core data structures for the tenant identity and access layer.
//! A `Tenant` owns its own OAuth credential bundle and the external
//! role-id mapping used by role synchronization; a `User` exists once
//! per external identity per tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Type-safe wrapper for tenant identifiers
///
/// Provides compile-time distinction between tenant IDs and other UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    /// Create a new random `TenantId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TenantId` from a UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Create a nil (all zeros) `TenantId`
    ///
    /// Used as the bootstrap sentinel for platform-level sessions that are
    /// not bound to any tenant (e.g. super-admin sign-in on the root domain).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Check if this is the bootstrap sentinel
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TenantId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TenantId> for Uuid {
    fn from(tenant_id: TenantId) -> Self {
        tenant_id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Internal role of a user within a tenant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular member (can file and view own reports)
    Player,
    /// Evaluator (can review and judge reports)
    Evaluator,
    /// Tenant administrator (full tenant configuration)
    Admin,
}

impl UserRole {
    /// Convert from database string
    #[must_use]
    pub fn from_db_string(s: &str) -> Self {
        match s {
            "ADMIN" => Self::Admin,
            "EVALUATOR" => Self::Evaluator,
            "PLAYER" => Self::Player,
            _ => {
                // Unknown role strings fall back to the lowest privilege
                tracing::warn!("Unknown user role '{}' encountered, defaulting to Player", s);
                Self::Player
            }
        }
    }

    /// Convert to database string
    #[must_use]
    pub const fn to_db_string(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Evaluator => "EVALUATOR",
            Self::Player => "PLAYER",
        }
    }

    /// Whether this role carries tenant admin rights
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role is evaluator-or-higher
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Evaluator)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Tenant organization in the multi-tenant system
///
/// Created and edited by platform operators only. End users never mutate
/// tenant records; deactivation (`is_active = false`) makes the tenant
/// invisible to host-based resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant identifier
    pub id: TenantId,
    /// Display name for the organization
    pub name: String,
    /// URL-safe identifier for the tenant (e.g., "acme")
    pub slug: String,
    /// Subdomain under the platform domain (e.g., "acme" in acme.platform.test)
    pub subdomain: String,
    /// Fully qualified custom domain (optional)
    pub custom_domain: Option<String>,
    /// Whether the tenant is active; inactive tenants never resolve
    pub is_active: bool,
    /// Per-tenant OAuth client ID (None until the operator configures it)
    pub oauth_client_id: Option<String>,
    /// Per-tenant OAuth client secret
    pub oauth_client_secret: Option<String>,
    /// External guild/workspace the tenant authenticates against
    pub guild_id: Option<String>,
    /// Comma-separated external role ids granting ADMIN
    pub role_admin: Option<String>,
    /// Comma-separated external role ids granting EVALUATOR
    pub role_evaluator: Option<String>,
    /// Comma-separated external role ids for PLAYER (informational)
    pub role_player: Option<String>,
    /// When tenant was created
    pub created_at: DateTime<Utc>,
    /// When tenant was last updated
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new active tenant without OAuth configuration
    #[must_use]
    pub fn new(name: String, slug: String, subdomain: String) -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::new(),
            name,
            slug,
            subdomain,
            custom_domain: None,
            is_active: true,
            oauth_client_id: None,
            oauth_client_secret: None,
            guild_id: None,
            role_admin: None,
            role_evaluator: None,
            role_player: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the tenant has a usable OAuth credential bundle
    #[must_use]
    pub fn has_oauth_credentials(&self) -> bool {
        self.oauth_client_id.as_deref().is_some_and(|s| !s.is_empty())
            && self
                .oauth_client_secret
                .as_deref()
                .is_some_and(|s| !s.is_empty())
    }
}

/// User account, one row per external identity per tenant
///
/// Uniqueness is composite on (`external_id`, `tenant_id`). Created on first
/// successful sign-in; `role`/`is_admin` are mutated only by role sync or an
/// explicit admin action, never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Stable id of the external identity (provider user id)
    pub external_id: String,
    /// Tenant this account belongs to
    pub tenant_id: TenantId,
    /// Display username from the external provider
    pub username: String,
    /// Avatar reference from the external provider
    pub avatar: Option<String>,
    /// Internal role
    pub role: UserRole,
    /// Convenience flag; must agree with `role == Admin`
    pub is_admin: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When roles were last synchronized from the provider
    pub last_synced_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default (lowest) role
    ///
    /// The creation path always starts at `Player`; elevation happens only
    /// through a completed role sync.
    #[must_use]
    pub fn new(
        external_id: String,
        tenant_id: TenantId,
        username: String,
        avatar: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id,
            tenant_id,
            username,
            avatar,
            role: UserRole::Player,
            is_admin: false,
            created_at: now,
            last_synced_at: now,
        }
    }
}

/// Result of mapping an external role set onto the internal role tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Granted internal role
    pub role: UserRole,
    /// Derived admin convenience flag
    pub is_admin: bool,
}

impl RoleGrant {
    /// Build a grant from a role, deriving the admin flag
    #[must_use]
    pub const fn from_role(role: UserRole) -> Self {
        Self {
            role,
            is_admin: role.is_admin(),
        }
    }
}

/// Identity attributes returned by the external provider after sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdentity {
    /// Stable external user id
    pub id: String,
    /// Username for display
    pub username: String,
    /// Avatar reference (optional)
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_priority_helpers() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::Admin.is_staff());
        assert!(!UserRole::Evaluator.is_admin());
        assert!(UserRole::Evaluator.is_staff());
        assert!(!UserRole::Player.is_staff());
    }

    #[test]
    fn test_role_db_round_trip() {
        for role in [UserRole::Player, UserRole::Evaluator, UserRole::Admin] {
            assert_eq!(UserRole::from_db_string(role.to_db_string()), role);
        }
        assert_eq!(UserRole::from_db_string("mystery"), UserRole::Player);
    }

    #[test]
    fn test_grant_derives_admin_flag() {
        assert!(RoleGrant::from_role(UserRole::Admin).is_admin);
        assert!(!RoleGrant::from_role(UserRole::Evaluator).is_admin);
    }

    #[test]
    fn test_tenant_credential_check() {
        let mut tenant = Tenant::new("Acme".into(), "acme".into(), "acme".into());
        assert!(!tenant.has_oauth_credentials());
        tenant.oauth_client_id = Some("client".into());
        tenant.oauth_client_secret = Some(String::new());
        assert!(!tenant.has_oauth_credentials());
        tenant.oauth_client_secret = Some("secret".into());
        assert!(tenant.has_oauth_credentials());
    }
}
