// ABOUTME: Tower middleware for session claims extraction and tenant context
// ABOUTME: Route-level guards funnel every check through the permission predicates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Request middleware
//!
//! Two layers run on every request, in order: session claims extraction,
//! then tenant resolution (which consults the masquerade override). Route
//! guards live in `admin_guard` and return the uniform access denial.

/// Route-level authorization guards
pub mod admin_guard;
/// Session claims extraction
pub mod auth;
/// Tenant context resolution
pub mod tenant;

pub use admin_guard::{require_authenticated, require_super_admin, require_tenant_admin_area};
pub use auth::{get_cookie_value, session_claims_middleware, ExtractedClaims, SESSION_COOKIE};
pub use tenant::{tenant_context_middleware, ResolvedTenant};
