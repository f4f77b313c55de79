// ABOUTME: Central authorization guards for protected route handlers
// ABOUTME: Routes every check through the permission predicates, denying uniformly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Authorization guards
//!
//! Handlers never compare roles inline; they call one of these guards.
//! Every failure path returns the same uniform denial so a caller cannot
//! distinguish "not signed in" from "wrong tenant" from "role too low" -
//! which would otherwise allow tenant enumeration through error messages.

use crate::auth::SessionClaims;
use crate::errors::AppError;
use crate::middleware::auth::ExtractedClaims;
use crate::middleware::tenant::ResolvedTenant;
use crate::models::Tenant;
use crate::permissions;

/// Require a live authenticated session
///
/// # Errors
///
/// Returns the uniform access denial when claims are absent or expired.
pub fn require_authenticated(claims: &ExtractedClaims) -> Result<&SessionClaims, AppError> {
    if !permissions::is_authenticated(claims.get()) {
        return Err(AppError::access_denied());
    }
    claims.get().ok_or_else(AppError::access_denied)
}

/// Require platform super-admin privileges
///
/// # Errors
///
/// Returns the uniform access denial when the session is missing, expired,
/// or not on the super-admin allow-list.
pub fn require_super_admin(claims: &ExtractedClaims) -> Result<&SessionClaims, AppError> {
    let claims = require_authenticated(claims)?;
    if !claims.is_super_admin {
        return Err(AppError::access_denied());
    }
    Ok(claims)
}

/// Require access to the resolved tenant's admin area
///
/// Super-admins bypass the tenant binding; everyone else must be staff of
/// exactly this tenant.
///
/// # Errors
///
/// Returns the uniform access denial when no tenant resolved or the
/// predicates reject the session.
pub fn require_tenant_admin_area<'a>(
    claims: &'a ExtractedClaims,
    tenant: &'a ResolvedTenant,
) -> Result<(&'a SessionClaims, &'a Tenant), AppError> {
    let claims = require_authenticated(claims)?;
    let tenant = tenant.get().ok_or_else(AppError::access_denied)?;
    if !permissions::can_access_tenant_admin_area(claims, tenant) {
        return Err(AppError::access_denied());
    }
    Ok((claims, tenant))
}
