// ABOUTME: Per-request construction of tenant-specific OAuth parameters
// ABOUTME: Replaces any static OAuth client with a pure factory over tenant data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Auth options factory
//!
//! OAuth parameters are built per request from the resolved tenant's
//! credential bundle. There is no process-wide mutable OAuth configuration:
//! credentials differ per tenant and must never leak across tenant
//! boundaries. A tenant with an incomplete bundle fails the handshake
//! closed - there is no fallback to another tenant's credentials.

use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, TenantId};
use std::sync::Arc;
use tracing::info;

/// Claim-enrichment inputs captured from the tenant at handshake time
///
/// Carried through the OAuth flow so the post-auth role sync uses exactly
/// the tenant that was active when the handshake started.
#[derive(Debug, Clone)]
pub struct ClaimEnrichment {
    /// Tenant the handshake is bound to
    pub tenant_id: TenantId,
    /// External guild the tenant authenticates against
    pub guild_id: String,
    /// Comma-separated external role ids granting ADMIN
    pub role_admin: Option<String>,
    /// Comma-separated external role ids granting EVALUATOR
    pub role_evaluator: Option<String>,
    /// Comma-separated external role ids for PLAYER
    pub role_player: Option<String>,
}

/// OAuth parameters for one handshake
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Post-auth enrichment; `None` for platform-root sign-in
    pub enrichment: Option<ClaimEnrichment>,
}

/// Builds OAuth options from the resolved tenant, per request
#[derive(Clone)]
pub struct AuthOptionsFactory {
    config: Arc<ServerConfig>,
}

impl AuthOptionsFactory {
    /// Create a new factory over the server configuration
    #[must_use]
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    /// Build OAuth options for the given tenant, or the platform default
    /// bundle when no tenant resolved
    ///
    /// # Errors
    ///
    /// Fails closed with a configuration error when the resolved tenant (or
    /// the platform default) lacks a client id/secret. The error surfaces to
    /// operators; end users see a generic failure.
    pub fn build(&self, tenant: Option<&Tenant>) -> AppResult<AuthOptions> {
        tenant.map_or_else(|| self.build_default(), |tenant| self.build_for(tenant))
    }

    /// Options from a tenant's own credential bundle
    fn build_for(&self, tenant: &Tenant) -> AppResult<AuthOptions> {
        if !tenant.has_oauth_credentials() {
            return Err(AppError::config_missing(format!(
                "tenant {} has no OAuth client credentials configured",
                tenant.slug
            ))
            .with_resource_id(tenant.id.to_string()));
        }
        let guild_id = tenant
            .guild_id
            .as_deref()
            .filter(|g| !g.is_empty())
            .ok_or_else(|| {
                AppError::config_missing(format!(
                    "tenant {} has no guild configured for role sync",
                    tenant.slug
                ))
            })?;

        info!(tenant = %tenant.slug, "built tenant-scoped auth options");

        Ok(AuthOptions {
            // has_oauth_credentials() guarantees both are present and non-empty
            client_id: tenant.oauth_client_id.clone().unwrap_or_default(),
            client_secret: tenant.oauth_client_secret.clone().unwrap_or_default(),
            scopes: self.config.oauth.scopes.clone(),
            redirect_uri: self.config.oauth.redirect_uri(),
            enrichment: Some(ClaimEnrichment {
                tenant_id: tenant.id,
                guild_id: guild_id.to_owned(),
                role_admin: tenant.role_admin.clone(),
                role_evaluator: tenant.role_evaluator.clone(),
                role_player: tenant.role_player.clone(),
            }),
        })
    }

    /// Options from the globally configured default bundle
    ///
    /// Used for the platform root domain and super-admin sign-in.
    fn build_default(&self) -> AppResult<AuthOptions> {
        let client_id = self
            .config
            .oauth
            .default_client_id
            .clone()
            .ok_or_else(|| {
                AppError::config_missing("no default OAuth client id configured for platform root")
            })?;
        let client_secret = self
            .config
            .oauth
            .default_client_secret
            .clone()
            .ok_or_else(|| {
                AppError::config_missing(
                    "no default OAuth client secret configured for platform root",
                )
            })?;

        Ok(AuthOptions {
            client_id,
            client_secret,
            scopes: self.config.oauth.scopes.clone(),
            redirect_uri: self.config.oauth.redirect_uri(),
            enrichment: None,
        })
    }

    /// Build the provider authorization redirect URL for a handshake
    #[must_use]
    pub fn authorize_url(&self, options: &AuthOptions, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.config.oauth.authorize_url,
            urlencoding::encode(&options.client_id),
            urlencoding::encode(&options.redirect_uri),
            urlencoding::encode(&options.scopes.join(" ")),
            urlencoding::encode(state),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::{
        AuthConfig, DatabaseConfig, DatabaseUrl, Environment, LogLevel, MasqueradeConfig,
        OAuthConfig, RoleSyncPolicy,
    };
    use crate::errors::ErrorCode;

    fn test_config(default_bundle: bool) -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            http_port: 0,
            log_level: LogLevel::Info,
            environment: Environment::Testing,
            database: DatabaseConfig {
                url: DatabaseUrl::Memory,
            },
            auth: AuthConfig {
                session_secret: vec![0; 32],
                session_expiry_hours: 24,
                super_admin_ids: vec![],
            },
            oauth: OAuthConfig {
                default_client_id: default_bundle.then(|| "platform-client".to_owned()),
                default_client_secret: default_bundle.then(|| "platform-secret".to_owned()),
                scopes: vec!["identify".into()],
                public_base_url: "https://tribunal.test".into(),
                authorize_url: "https://provider.test/oauth2/authorize".into(),
                token_url: "https://provider.test/oauth2/token".into(),
                identity_url: "https://provider.test/users/@me".into(),
                membership_base_url: "https://provider.test".into(),
                membership_bot_token: "bot-token".into(),
                provider_timeout_secs: 8,
            },
            masquerade: MasqueradeConfig { max_age_secs: 3600 },
            role_sync_policy: RoleSyncPolicy::RetainOnFailure,
        })
    }

    fn configured_tenant() -> Tenant {
        let mut tenant = Tenant::new("Acme".into(), "acme".into(), "acme".into());
        tenant.oauth_client_id = Some("acme-client".into());
        tenant.oauth_client_secret = Some("acme-secret".into());
        tenant.guild_id = Some("guild-1".into());
        tenant.role_admin = Some("111".into());
        tenant
    }

    #[test]
    fn test_tenant_options_use_tenant_bundle() {
        let factory = AuthOptionsFactory::new(test_config(true));
        let tenant = configured_tenant();
        let options = factory.build(Some(&tenant)).unwrap();

        assert_eq!(options.client_id, "acme-client");
        assert_eq!(options.client_secret, "acme-secret");
        let enrichment = options.enrichment.unwrap();
        assert_eq!(enrichment.tenant_id, tenant.id);
        assert_eq!(enrichment.guild_id, "guild-1");
    }

    #[test]
    fn test_missing_tenant_credentials_fail_closed() {
        let factory = AuthOptionsFactory::new(test_config(true));
        let tenant = Tenant::new("Bare".into(), "bare".into(), "bare".into());
        let err = factory.build(Some(&tenant)).unwrap_err();
        // No fallback to the platform default bundle
        assert_eq!(err.code, ErrorCode::ConfigMissing);
    }

    #[test]
    fn test_platform_root_uses_default_bundle() {
        let factory = AuthOptionsFactory::new(test_config(true));
        let options = factory.build(None).unwrap();
        assert_eq!(options.client_id, "platform-client");
        assert!(options.enrichment.is_none());
    }

    #[test]
    fn test_platform_root_without_default_fails() {
        let factory = AuthOptionsFactory::new(test_config(false));
        let err = factory.build(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissing);
    }

    #[test]
    fn test_authorize_url_is_escaped() {
        let factory = AuthOptionsFactory::new(test_config(true));
        let options = factory.build(None).unwrap();
        let url = factory.authorize_url(&options, "state token");
        assert!(url.starts_with("https://provider.test/oauth2/authorize?client_id="));
        assert!(url.contains("state=state%20token"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Ftribunal.test%2Fauth%2Fcallback"));
    }
}
