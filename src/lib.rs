// ABOUTME: Main library entry point for the Tribunal multi-tenant platform
// ABOUTME: Tenant resolution, dynamic auth options, role sync, and masquerade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

#![deny(unsafe_code)]

//! # Tribunal Server
//!
//! Tenant identity and access resolution layer for a multi-tenant report
//! review platform. Given an inbound HTTP request, this crate:
//!
//! - determines which tenant's configuration applies (host header, with a
//!   super-admin masquerade override layered on top)
//! - constructs per-tenant OAuth parameters dynamically - no static client
//!   is registered at boot
//! - exchanges an external guild membership for an internal role grant
//! - lets a platform operator transparently view any tenant's admin area
//!   without losing their own privileged identity
//!
//! ## Architecture
//!
//! - **`tenant`**: host-based resolution, per-tenant auth options, masquerade
//! - **`roles`**: external role set to internal tier mapping and sync
//! - **`auth`**: session claims construction and JWT signing
//! - **`permissions`**: the single predicate set every route guard consumes
//! - **`database_plugins`**: tenant and user stores behind a provider trait
//! - **`middleware` / `routes`**: the HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tribunal_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Tribunal server configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Session claims construction, signing, and validation
pub mod auth;

/// Configuration management
pub mod config;

/// Database abstraction layer with plugin support
pub mod database_plugins;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// External identity provider clients
pub mod external;

/// Logging configuration
pub mod logging;

/// Request middleware and route guards
pub mod middleware;

/// Core data models
pub mod models;

/// Permission predicates
pub mod permissions;

/// Shared server resources
pub mod resources;

/// Role synchronization
pub mod roles;

/// HTTP routes
pub mod routes;

/// Multi-tenant identity layer
pub mod tenant;
