// ABOUTME: Pure permission predicates over session claims and tenant records
// ABOUTME: Single source of truth for every route-level authorization check
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Permission evaluation
//!
//! Every protected route consumes these predicates; no handler re-derives
//! role logic. The cross-tenant isolation invariant lives here: a
//! non-super-admin's rights from tenant A never satisfy a check evaluated
//! against tenant B - tenant-id equality is mandatory for every non-bypass
//! check.

use crate::auth::SessionClaims;
use crate::models::{Tenant, UserRole};

/// Claims are present and not expired
#[must_use]
pub fn is_authenticated(claims: Option<&SessionClaims>) -> bool {
    claims.is_some_and(|c| !c.is_expired())
}

/// Tenant admin check
///
/// Honors both the role and the convenience flag; disagreement between the
/// two is caught upstream by the claims builder, so here either signal
/// suffices.
#[must_use]
pub fn is_admin(claims: &SessionClaims) -> bool {
    claims.role == UserRole::Admin || claims.is_admin
}

/// Evaluator-or-higher check
#[must_use]
pub fn is_staff(claims: &SessionClaims) -> bool {
    claims.role.is_staff() || claims.is_admin
}

/// Whether the session may access a tenant's admin area
///
/// Super-admins bypass tenant binding entirely; everyone else must be staff
/// AND bound to exactly this tenant.
#[must_use]
pub fn can_access_tenant_admin_area(claims: &SessionClaims, tenant: &Tenant) -> bool {
    if claims.is_expired() {
        return false;
    }
    if claims.is_super_admin {
        return true;
    }
    is_staff(claims) && claims.tenant_id == tenant.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TenantId;
    use chrono::Utc;

    fn claims(role: UserRole, tenant_id: TenantId) -> SessionClaims {
        SessionClaims {
            sub: "ext-1".into(),
            tenant_id,
            role,
            is_admin: role.is_admin(),
            is_super_admin: false,
            iat: Utc::now().timestamp() * 1000,
            exp: Utc::now().timestamp() + 3600,
        }
    }

    #[test]
    fn test_expired_claims_are_not_authenticated() {
        let mut c = claims(UserRole::Admin, TenantId::new());
        assert!(is_authenticated(Some(&c)));
        c.exp = Utc::now().timestamp() - 10;
        assert!(!is_authenticated(Some(&c)));
        assert!(!is_authenticated(None));
    }

    #[test]
    fn test_staff_and_admin_tiers() {
        let tenant_id = TenantId::new();
        assert!(is_admin(&claims(UserRole::Admin, tenant_id)));
        assert!(!is_admin(&claims(UserRole::Evaluator, tenant_id)));
        assert!(is_staff(&claims(UserRole::Evaluator, tenant_id)));
        assert!(!is_staff(&claims(UserRole::Player, tenant_id)));
    }

    #[test]
    fn test_cross_tenant_isolation() {
        let tenant_a = Tenant::new("A".into(), "a".into(), "a".into());
        let tenant_b = Tenant::new("B".into(), "b".into(), "b".into());
        let staff_of_a = claims(UserRole::Admin, tenant_a.id);

        assert!(can_access_tenant_admin_area(&staff_of_a, &tenant_a));
        // Admin rights in tenant A mean nothing in tenant B
        assert!(!can_access_tenant_admin_area(&staff_of_a, &tenant_b));
    }

    #[test]
    fn test_super_admin_bypasses_tenant_binding() {
        let tenant = Tenant::new("A".into(), "a".into(), "a".into());
        let mut c = claims(UserRole::Player, TenantId::nil());
        c.is_super_admin = true;
        assert!(can_access_tenant_admin_area(&c, &tenant));
    }

    #[test]
    fn test_expired_super_admin_is_denied() {
        let tenant = Tenant::new("A".into(), "a".into(), "a".into());
        let mut c = claims(UserRole::Player, TenantId::nil());
        c.is_super_admin = true;
        c.exp = Utc::now().timestamp() - 10;
        assert!(!can_access_tenant_admin_area(&c, &tenant));
    }
}
