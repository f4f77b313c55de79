// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management for production deployment

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Maximum allowed masquerade cookie lifetime (24 hours)
pub const MASQUERADE_MAX_AGE_CEILING_SECS: u64 = 86_400;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Standard operational logging
    #[default]
    Info,
    /// Verbose diagnostics
    Debug,
    /// Full tracing output
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for security and cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated testing
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// SQLite database with file path
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory SQLite (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite:").unwrap_or(s);
        if path_str == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path_str),
            }
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/tribunal.db"),
        }
    }
}

impl std::fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: DatabaseUrl,
}

/// Authentication and session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session token signing (hex-decoded)
    pub session_secret: Vec<u8>,
    /// Session token lifetime in hours
    pub session_expiry_hours: i64,
    /// External ids of platform super-admins
    ///
    /// This allow-list is the only source of `is_super_admin`; role sync
    /// never grants it.
    pub super_admin_ids: Vec<String>,
}

/// Policy applied when the external membership lookup fails
///
/// `RetainOnFailure` keeps the previously stored role for existing users
/// (availability over strictness); `DenyOnFailure` hard-denies sign-in when
/// membership cannot be resolved. Either way a brand-new user is never
/// granted an elevated role on failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleSyncPolicy {
    /// Keep the last-known role when the provider is unreachable
    #[default]
    RetainOnFailure,
    /// Refuse sign-in when membership cannot be resolved
    DenyOnFailure,
}

impl RoleSyncPolicy {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "deny" | "deny_on_failure" | "strict" => Self::DenyOnFailure,
            _ => Self::RetainOnFailure,
        }
    }
}

/// OAuth and external identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Default OAuth client id (platform root domain, super-admin sign-in)
    pub default_client_id: Option<String>,
    /// Default OAuth client secret
    pub default_client_secret: Option<String>,
    /// OAuth scopes requested during the handshake
    pub scopes: Vec<String>,
    /// Public base URL of this deployment, used to build redirect URIs
    pub public_base_url: String,
    /// Provider authorization endpoint
    pub authorize_url: String,
    /// Provider token endpoint
    pub token_url: String,
    /// Provider identity endpoint (current user)
    pub identity_url: String,
    /// Base URL of the provider membership API
    pub membership_base_url: String,
    /// Bot/service credential for membership lookups
    pub membership_bot_token: String,
    /// Timeout for provider round trips in seconds
    pub provider_timeout_secs: u64,
}

impl OAuthConfig {
    /// Redirect URI registered with the identity provider
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}/auth/callback",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

/// Masquerade override cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasqueradeConfig {
    /// Override cookie lifetime in seconds, capped at 24 hours
    pub max_age_secs: u64,
}

impl MasqueradeConfig {
    /// Cookie lifetime clamped to the 24h ceiling
    #[must_use]
    pub fn effective_max_age(&self) -> u64 {
        self.max_age_secs.min(MASQUERADE_MAX_AGE_CEILING_SECS)
    }
}

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// OAuth and provider configuration
    pub oauth: OAuthConfig,
    /// Masquerade cookie configuration
    pub masquerade: MasqueradeConfig,
    /// Membership failure policy
    pub role_sync_policy: RoleSyncPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `TRIBUNAL_SESSION_SECRET` is missing or not valid hex
    /// - numeric variables fail to parse
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("TRIBUNAL_SESSION_SECRET")
            .map_err(|_| anyhow!("TRIBUNAL_SESSION_SECRET must be set (64-byte hex string)"))
            .and_then(|raw| {
                hex::decode(raw.trim())
                    .context("TRIBUNAL_SESSION_SECRET is not valid hex")
            })?;
        if session_secret.len() < 32 {
            return Err(anyhow!(
                "TRIBUNAL_SESSION_SECRET must decode to at least 32 bytes, got {}",
                session_secret.len()
            ));
        }

        let super_admin_ids = env::var("TRIBUNAL_SUPER_ADMINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let scopes = env::var("TRIBUNAL_OAUTH_SCOPES")
            .map(|raw| {
                raw.split_whitespace()
                    .map(ToOwned::to_owned)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|_| vec!["identify".to_owned()]);

        Ok(Self {
            http_port: parse_env_or("TRIBUNAL_HTTP_PORT", 8081_u16)?,
            log_level: LogLevel::from_str_or_default(
                &env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            ),
            environment: Environment::from_str_or_default(
                &env::var("ENVIRONMENT").unwrap_or_default(),
            ),
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(
                    &env::var("DATABASE_URL")
                        .unwrap_or_else(|_| "sqlite:./data/tribunal.db".into()),
                ),
            },
            auth: AuthConfig {
                session_secret,
                session_expiry_hours: parse_env_or("TRIBUNAL_SESSION_EXPIRY_HOURS", 24_i64)?,
                super_admin_ids,
            },
            oauth: OAuthConfig {
                default_client_id: env_var_non_empty("TRIBUNAL_OAUTH_CLIENT_ID"),
                default_client_secret: env_var_non_empty("TRIBUNAL_OAUTH_CLIENT_SECRET"),
                scopes,
                public_base_url: env::var("TRIBUNAL_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8081".into()),
                authorize_url: env::var("TRIBUNAL_PROVIDER_AUTHORIZE_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/oauth2/authorize".into()),
                token_url: env::var("TRIBUNAL_PROVIDER_TOKEN_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/oauth2/token".into()),
                identity_url: env::var("TRIBUNAL_PROVIDER_IDENTITY_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/v10/users/@me".into()),
                membership_base_url: env::var("TRIBUNAL_MEMBERSHIP_BASE_URL")
                    .unwrap_or_else(|_| "https://discord.com/api/v10".into()),
                membership_bot_token: env::var("TRIBUNAL_PROVIDER_BOT_TOKEN").unwrap_or_default(),
                provider_timeout_secs: parse_env_or("TRIBUNAL_PROVIDER_TIMEOUT_SECS", 8_u64)?,
            },
            masquerade: MasqueradeConfig {
                max_age_secs: parse_env_or(
                    "TRIBUNAL_MASQUERADE_MAX_AGE_SECS",
                    MASQUERADE_MAX_AGE_CEILING_SECS,
                )?,
            },
            role_sync_policy: RoleSyncPolicy::from_str_or_default(
                &env::var("TRIBUNAL_ROLE_SYNC_POLICY").unwrap_or_default(),
            ),
        })
    }

    /// One-line configuration summary for startup logging
    ///
    /// Never includes secrets.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} environment={} database={} super_admins={} role_sync_policy={:?}",
            self.http_port,
            self.environment,
            self.database.url,
            self.auth.super_admin_ids.len(),
            self.role_sync_policy,
        )
    }
}

/// Read an env var, treating empty strings as unset
fn env_var_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an env var into `T`, falling back to a default when unset
fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
