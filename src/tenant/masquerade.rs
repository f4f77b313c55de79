// ABOUTME: Super-admin masquerade override controller and cookie handling
// ABOUTME: Two-state machine that redirects tenant resolution without touching claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Masquerade control
//!
//! A platform super-admin can point tenant resolution at any tenant through
//! a short-lived override cookie. The override never mutates the
//! super-admin's own session claims, role, or tenant binding - the resolver
//! layers it on top at resolution time, so the underlying identity stays
//! intact and auditable.
//!
//! State machine: `Direct` (no override) and `Masquerading(slug)`. Entering
//! while already masquerading replaces the cookie value; there is no
//! nesting. Exit always returns to `Direct`.

use crate::auth::SessionClaims;
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use tracing::info;

/// Name of the masquerade override cookie
///
/// The value is the bare tenant slug - no JSON - so the cookie stays
/// trivially inspectable and auditable.
pub const MASQUERADE_COOKIE: &str = "tenant_override";

/// Parsed masquerade override from the request cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasqueradeOverride {
    /// Slug of the tenant being viewed
    pub target_slug: String,
}

impl MasqueradeOverride {
    /// Parse an override from a raw cookie value
    ///
    /// Returns `None` for empty values or values that cannot be a slug;
    /// a garbage cookie is ignored rather than rejected.
    #[must_use]
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.len() > 64 {
            return None;
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(Self {
            target_slug: value.to_owned(),
        })
    }
}

/// Masquerade state derived from the override cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasqueradeState {
    /// No override; resolution is host-based
    Direct,
    /// Resolution is redirected to the named tenant
    Masquerading(String),
}

impl MasqueradeState {
    /// Derive the state from a parsed override
    #[must_use]
    pub fn of(override_cookie: Option<&MasqueradeOverride>) -> Self {
        override_cookie.map_or(Self::Direct, |o| Self::Masquerading(o.target_slug.clone()))
    }
}

/// Controller for entering and exiting masquerade
#[derive(Clone)]
pub struct MasqueradeController {
    database: Arc<Database>,
    max_age_secs: u64,
}

impl MasqueradeController {
    /// Create a new controller
    ///
    /// `max_age_secs` is clamped by the caller's configuration to at most
    /// 24 hours.
    #[must_use]
    pub fn new(database: Arc<Database>, max_age_secs: u64) -> Self {
        Self {
            database,
            max_age_secs,
        }
    }

    /// Enter masquerade for the named tenant
    ///
    /// Returns the `Set-Cookie` header value. The caller's claims are left
    /// untouched; only the override cookie changes.
    ///
    /// # Errors
    ///
    /// Returns the uniform access denial when the requester is not a
    /// super-admin, and an input error when the slug does not name an
    /// active tenant.
    pub async fn enter(
        &self,
        claims: Option<&SessionClaims>,
        target_slug: &str,
    ) -> AppResult<String> {
        let claims = Self::require_super_admin(claims)?;

        let tenant = self
            .database
            .get_tenant_by_slug(target_slug)
            .await
            .map_err(|e| AppError::database(format!("tenant lookup failed: {e}")))?
            .filter(|t| t.is_active)
            .ok_or_else(|| {
                AppError::invalid_input(format!("no active tenant with slug '{target_slug}'"))
            })?;

        info!(
            super_admin = %claims.sub,
            target = %tenant.slug,
            "super-admin entered masquerade"
        );

        Ok(format!(
            "{MASQUERADE_COOKIE}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            tenant.slug, self.max_age_secs
        ))
    }

    /// Exit masquerade
    ///
    /// Returns the clearing `Set-Cookie` header value. Idempotent: exiting
    /// from `Direct` is a no-op clear.
    ///
    /// # Errors
    ///
    /// Returns the uniform access denial when the requester is not a
    /// super-admin.
    pub fn exit(claims: Option<&SessionClaims>) -> AppResult<String> {
        let claims = Self::require_super_admin(claims)?;

        info!(super_admin = %claims.sub, "super-admin exited masquerade");

        Ok(format!(
            "{MASQUERADE_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"
        ))
    }

    /// Gate: only super-admins may operate the override
    fn require_super_admin(claims: Option<&SessionClaims>) -> AppResult<&SessionClaims> {
        match claims {
            Some(claims) if claims.is_super_admin && !claims.is_expired() => Ok(claims),
            _ => Err(AppError::access_denied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_parsing() {
        assert_eq!(
            MasqueradeOverride::from_cookie_value("acme"),
            Some(MasqueradeOverride {
                target_slug: "acme".into()
            })
        );
        assert_eq!(
            MasqueradeOverride::from_cookie_value(" beta-2 "),
            Some(MasqueradeOverride {
                target_slug: "beta-2".into()
            })
        );
        assert_eq!(MasqueradeOverride::from_cookie_value(""), None);
        assert_eq!(MasqueradeOverride::from_cookie_value("a b"), None);
        assert_eq!(MasqueradeOverride::from_cookie_value("{\"slug\":\"x\"}"), None);
    }

    #[test]
    fn test_state_machine_shape() {
        assert_eq!(MasqueradeState::of(None), MasqueradeState::Direct);
        let override_cookie = MasqueradeOverride {
            target_slug: "acme".into(),
        };
        assert_eq!(
            MasqueradeState::of(Some(&override_cookie)),
            MasqueradeState::Masquerading("acme".into())
        );
    }
}
