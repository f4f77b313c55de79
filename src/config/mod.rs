// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Re-exports the environment configuration types used across the crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Configuration management
//!
//! The server is configured exclusively through environment variables;
//! there are no configuration files.

/// Environment-based configuration management
pub mod environment;

pub use environment::{
    AuthConfig, DatabaseConfig, DatabaseUrl, Environment, LogLevel, MasqueradeConfig, OAuthConfig,
    RoleSyncPolicy, ServerConfig,
};
