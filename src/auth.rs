// ABOUTME: JWT-based session claims construction, signing, and validation
// ABOUTME: Binds identity, role, and tenant into signed session tokens
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Tribunal Project

//! # Authentication and Session Management
//!
//! Session claims are built once per sign-in (or explicit re-sync) and carry
//! the identity, the role granted for the tenant that was active during the
//! OAuth handshake, and the platform-wide super-admin flag. Claims are never
//! re-bound to a different tenant without a new sign-in; masquerade operates
//! below this layer, inside tenant resolution.

use crate::errors::{AppError, AppResult};
use crate::models::{ProviderIdentity, Tenant, TenantId, User, UserRole};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Session token validation error with detailed information
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionTokenError {
    /// Token has expired
    #[error("session token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Token signature is invalid
    #[error("session token signature is invalid: {reason}")]
    Invalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper JWT format)
    #[error("session token is malformed: {details}")]
    Malformed {
        /// Details about malformation
        details: String,
    },
}

/// Signed session claims carried by every authenticated request
///
/// Wire format matches the platform session token contract:
/// `{ sub, tenantId, role, isAdmin, isSuperAdmin, iat, exp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Stable external identity id
    pub sub: String,
    /// Tenant bound at sign-in time; `TenantId::nil()` is the platform
    /// bootstrap sentinel
    pub tenant_id: TenantId,
    /// Internal role within the bound tenant
    pub role: UserRole,
    /// Admin convenience flag, always derived from `role`
    pub is_admin: bool,
    /// Platform-wide super-admin flag, sourced only from the allow-list
    pub is_super_admin: bool,
    /// Issued at timestamp (milliseconds, unique per token)
    pub iat: i64,
    /// Expiration timestamp (seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Whether the claims have passed their expiry
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Statically configured set of platform super-admin external ids
///
/// This is the only source of `is_super_admin`; it is independent of any
/// tenant and of role synchronization.
#[derive(Debug, Clone, Default)]
pub struct SuperAdminAllowList {
    ids: HashSet<String>,
}

impl SuperAdminAllowList {
    /// Build the allow-list from configured external ids
    #[must_use]
    pub fn new(ids: &[String]) -> Self {
        Self {
            ids: ids.iter().map(|s| s.trim().to_owned()).collect(),
        }
    }

    /// Whether the given external identity is a platform super-admin
    #[must_use]
    pub fn contains(&self, external_id: &str) -> bool {
        self.ids.contains(external_id)
    }

    /// Number of configured super-admins
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the allow-list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Authentication manager for session tokens
///
/// Builds claims from the authenticated user and the tenant active during
/// the handshake, signs them with HS256, and validates inbound tokens.
pub struct AuthManager {
    secret: Vec<u8>,
    token_expiry_hours: i64,
    /// Monotonic counter to ensure unique issued-at values for tokens
    token_counter: AtomicU64,
}

impl Clone for AuthManager {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret.clone(),
            token_expiry_hours: self.token_expiry_hours,
            // Fresh counter for the cloned instance; uniqueness is maintained
            // independently per instance
            token_counter: AtomicU64::new(0),
        }
    }
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub const fn new(secret: Vec<u8>, token_expiry_hours: i64) -> Self {
        Self {
            secret,
            token_expiry_hours,
            token_counter: AtomicU64::new(0),
        }
    }

    /// Build session claims for a user signed in under a tenant
    ///
    /// `tenant_id` is bound here, at sign-in time. `is_super_admin` comes
    /// exclusively from the allow-list keyed by the external identity.
    ///
    /// # Errors
    ///
    /// Returns an `InvariantViolation` error if the stored user state
    /// disagrees with itself (`role == Admin` without `is_admin`, or the
    /// reverse). The violation is logged and never silently coerced.
    pub fn build_claims(
        &self,
        user: &User,
        tenant: Option<&Tenant>,
        allow_list: &SuperAdminAllowList,
    ) -> AppResult<SessionClaims> {
        if user.role.is_admin() != user.is_admin {
            tracing::error!(
                user_id = %user.id,
                tenant_id = %user.tenant_id,
                role = %user.role,
                is_admin = user.is_admin,
                "stored role and is_admin flag disagree; refusing to issue claims"
            );
            return Err(AppError::invariant_violation(format!(
                "user {} has role {} but is_admin={}",
                user.id, user.role, user.is_admin
            )));
        }

        if let Some(tenant) = tenant {
            if tenant.id != user.tenant_id {
                tracing::error!(
                    user_id = %user.id,
                    user_tenant = %user.tenant_id,
                    handshake_tenant = %tenant.id,
                    "user record belongs to a different tenant than the handshake"
                );
                return Err(AppError::invariant_violation(format!(
                    "user {} is not bound to tenant {}",
                    user.id, tenant.id
                )));
            }
        }

        let (iat, exp) = self.issue_window();
        Ok(SessionClaims {
            sub: user.external_id.clone(),
            tenant_id: tenant.map_or_else(TenantId::nil, |t| t.id),
            role: user.role,
            is_admin: user.is_admin,
            is_super_admin: allow_list.contains(&user.external_id),
            iat,
            exp,
        })
    }

    /// Build bootstrap claims for a platform-level sign-in with no tenant
    ///
    /// Used on the root domain where no user row exists. The role is the
    /// lowest tier; any privilege comes from the super-admin flag alone.
    #[must_use]
    pub fn build_bootstrap_claims(
        &self,
        identity: &ProviderIdentity,
        allow_list: &SuperAdminAllowList,
    ) -> SessionClaims {
        let (iat, exp) = self.issue_window();
        SessionClaims {
            sub: identity.id.clone(),
            tenant_id: TenantId::nil(),
            role: UserRole::Player,
            is_admin: false,
            is_super_admin: allow_list.contains(&identity.id),
            iat,
            exp,
        }
    }

    /// Sign claims into a session token
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, claims: &SessionClaims) -> Result<String> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.secret);
        Ok(encode(&header, claims, &key)?)
    }

    /// Validate a session token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`SessionTokenError`] if the token signature is invalid,
    /// the token is malformed, or the claims have expired.
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let claims = self.decode_token_claims(token)?;

        if claims.is_expired() {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            tracing::debug!(sub = %claims.sub, %expired_at, "session token expired");
            return Err(SessionTokenError::Expired { expired_at });
        }

        Ok(claims)
    }

    /// Decode token claims without expiration validation
    ///
    /// Expiry is checked separately so an expired-but-authentic token can be
    /// reported distinctly from a forged one.
    fn decode_token_claims(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let key = DecodingKey::from_secret(&self.secret);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<SessionClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> SessionTokenError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => SessionTokenError::Invalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => SessionTokenError::Malformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => SessionTokenError::Malformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => SessionTokenError::Malformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            _ => SessionTokenError::Invalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }

    /// Issued-at / expiry pair for a new token
    ///
    /// Uses an atomic counter so two tokens issued in the same second still
    /// differ.
    fn issue_window(&self) -> (i64, i64) {
        let now = Utc::now();
        let counter = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let unique_iat =
            now.timestamp() * 1000 + i64::from(u32::try_from(counter % 1000).unwrap_or(0));
        let exp = (now + Duration::hours(self.token_expiry_hours)).timestamp();
        (unique_iat, exp)
    }
}

/// Generate a random session signing secret
///
/// # Errors
///
/// Returns an error if the system RNG fails - this is a critical security
/// failure and the server cannot operate securely without working RNG.
pub fn generate_session_secret() -> Result<[u8; 64]> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut secret = [0u8; 64];

    rng.fill(&mut secret).map_err(|e| {
        tracing::error!(
            "CRITICAL: Failed to generate cryptographically secure session secret: {}",
            e
        );
        anyhow::anyhow!("System RNG failure - cannot generate secure session secret")
    })?;

    Ok(secret)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::Tenant;

    fn manager() -> AuthManager {
        AuthManager::new(b"unit-test-secret-at-least-32-bytes!!".to_vec(), 24)
    }

    fn user_in(tenant: &Tenant) -> User {
        User::new("ext-1".into(), tenant.id, "casey".into(), None)
    }

    #[test]
    fn test_round_trip_claims() {
        let auth = manager();
        let tenant = Tenant::new("Acme".into(), "acme".into(), "acme".into());
        let user = user_in(&tenant);
        let claims = auth
            .build_claims(&user, Some(&tenant), &SuperAdminAllowList::default())
            .unwrap();
        let token = auth.generate_token(&claims).unwrap();
        let decoded = auth.validate_token(&token).unwrap();

        assert_eq!(decoded.sub, "ext-1");
        assert_eq!(decoded.tenant_id, tenant.id);
        assert_eq!(decoded.role, UserRole::Player);
        assert!(!decoded.is_super_admin);
    }

    #[test]
    fn test_invariant_violation_is_rejected() {
        let auth = manager();
        let tenant = Tenant::new("Acme".into(), "acme".into(), "acme".into());
        let mut user = user_in(&tenant);
        user.role = UserRole::Admin;
        user.is_admin = false; // corrupted state

        let err = auth
            .build_claims(&user, Some(&tenant), &SuperAdminAllowList::default())
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvariantViolation);
    }

    #[test]
    fn test_super_admin_comes_only_from_allow_list() {
        let auth = manager();
        let tenant = Tenant::new("Acme".into(), "acme".into(), "acme".into());
        let mut user = user_in(&tenant);
        user.role = UserRole::Admin;
        user.is_admin = true;

        let claims = auth
            .build_claims(&user, Some(&tenant), &SuperAdminAllowList::default())
            .unwrap();
        // Tenant admin is not platform super-admin
        assert!(!claims.is_super_admin);

        let allow = SuperAdminAllowList::new(&["ext-1".to_owned()]);
        let claims = auth.build_claims(&user, Some(&tenant), &allow).unwrap();
        assert!(claims.is_super_admin);
    }

    #[test]
    fn test_bootstrap_claims_use_nil_tenant() {
        let auth = manager();
        let identity = ProviderIdentity {
            id: "root-admin".into(),
            username: "root".into(),
            avatar: None,
        };
        let allow = SuperAdminAllowList::new(&["root-admin".to_owned()]);
        let claims = auth.build_bootstrap_claims(&identity, &allow);

        assert!(claims.tenant_id.is_nil());
        assert!(claims.is_super_admin);
        assert_eq!(claims.role, UserRole::Player);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let auth = manager();
        let other = AuthManager::new(b"a-completely-different-signing-key!!".to_vec(), 24);
        let identity = ProviderIdentity {
            id: "ext-9".into(),
            username: "mallory".into(),
            avatar: None,
        };
        let claims = auth.build_bootstrap_claims(&identity, &SuperAdminAllowList::default());
        let token = auth.generate_token(&claims).unwrap();

        assert!(matches!(
            other.validate_token(&token),
            Err(SessionTokenError::Invalid { .. })
        ));
        assert!(matches!(
            auth.validate_token("not.a.token"),
            Err(SessionTokenError::Invalid { .. } | SessionTokenError::Malformed { .. })
        ));
    }
}
