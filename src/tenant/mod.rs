// ABOUTME: Multi-tenant identity resolution for the tribunal platform
// ABOUTME: Host-based tenant resolution, per-tenant auth options, and masquerade
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Tribunal Project

//! # Multi-Tenant Identity Layer
//!
//! This module implements tenant identity for the platform:
//! - Host-header based tenant resolution with a super-admin override path
//! - Per-tenant OAuth credential isolation (no static client at boot)
//! - Masquerade: a super-admin views a tenant without mutating their own
//!   session claims

/// Per-tenant OAuth options construction
pub mod auth_options;
/// Super-admin masquerade override
pub mod masquerade;
/// Host-based tenant resolution
pub mod resolver;

pub use auth_options::{AuthOptions, AuthOptionsFactory, ClaimEnrichment};
pub use masquerade::{MasqueradeController, MasqueradeOverride, MasqueradeState, MASQUERADE_COOKIE};
pub use resolver::TenantResolver;
