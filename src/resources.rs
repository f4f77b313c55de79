// ABOUTME: Shared server resources wired once at startup and injected into routes
// ABOUTME: Holds the database, auth manager, resolver, factories, and sync machinery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Server resources
//!
//! One instance is built at startup and shared across all request handlers
//! behind an `Arc`. Nothing in here is per-tenant mutable state: OAuth
//! options are built per request, and the only cross-request mutation is
//! the short-lived handshake state map.

use crate::auth::{AuthManager, SuperAdminAllowList};
use crate::config::ServerConfig;
use crate::database_plugins::factory::Database;
use crate::external::membership::MembershipProvider;
use crate::external::{HttpMembershipClient, OAuthCodeClient};
use crate::models::TenantId;
use crate::roles::RoleSyncer;
use crate::tenant::{AuthOptionsFactory, MasqueradeController, TenantResolver};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::RwLock;

/// Pending OAuth handshake state (CSRF protection)
///
/// Binds the `state` parameter to the tenant that was active when the
/// handshake started, so the callback cannot be replayed against a
/// different tenant's credentials.
#[derive(Debug, Clone)]
pub struct HandshakeState {
    /// Tenant active at handshake start; `None` for platform root
    pub tenant_id: Option<TenantId>,
    /// When the handshake was started
    pub created_at: DateTime<Utc>,
    /// When the state expires
    pub expires_at: DateTime<Utc>,
}

impl HandshakeState {
    /// Create a state entry with the standard 10-minute expiry
    #[must_use]
    pub fn new(tenant_id: Option<TenantId>) -> Self {
        let now = Utc::now();
        Self {
            tenant_id,
            created_at: now,
            expires_at: now + Duration::minutes(10),
        }
    }

    /// Whether the state entry has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Shared resources for all request handlers
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Database (tenant store + user store)
    pub database: Arc<Database>,
    /// Session claims builder and token signer
    pub auth_manager: Arc<AuthManager>,
    /// Platform super-admin allow-list
    pub allow_list: SuperAdminAllowList,
    /// Host-based tenant resolution
    pub resolver: TenantResolver,
    /// Per-request OAuth options construction
    pub auth_options: AuthOptionsFactory,
    /// Masquerade override control
    pub masquerade: MasqueradeController,
    /// External membership synchronization
    pub role_syncer: RoleSyncer,
    /// OAuth code exchange client
    pub oauth_client: OAuthCodeClient,
    /// Pending handshake states keyed by the `state` parameter
    pub oauth_states: RwLock<HashMap<String, HandshakeState>>,
}

impl ServerResources {
    /// Build resources with the production HTTP membership client
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: ServerConfig, database: Database) -> Result<Self> {
        let timeout = StdDuration::from_secs(config.oauth.provider_timeout_secs);
        let membership: Arc<dyn MembershipProvider> = Arc::new(HttpMembershipClient::new(
            &config.oauth.membership_base_url,
            &config.oauth.membership_bot_token,
            timeout,
        )?);
        Self::with_membership_provider(config, database, membership)
    }

    /// Build resources with a caller-supplied membership provider
    ///
    /// Used by tests to substitute an in-memory provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the OAuth HTTP client cannot be constructed.
    pub fn with_membership_provider(
        config: ServerConfig,
        database: Database,
        membership: Arc<dyn MembershipProvider>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let database = Arc::new(database);
        let timeout = StdDuration::from_secs(config.oauth.provider_timeout_secs);

        let auth_manager = Arc::new(AuthManager::new(
            config.auth.session_secret.clone(),
            config.auth.session_expiry_hours,
        ));
        let allow_list = SuperAdminAllowList::new(&config.auth.super_admin_ids);
        let resolver = TenantResolver::new(Arc::clone(&database));
        let auth_options = AuthOptionsFactory::new(Arc::clone(&config));
        let masquerade = MasqueradeController::new(
            Arc::clone(&database),
            config.masquerade.effective_max_age(),
        );
        let role_syncer = RoleSyncer::new(
            membership,
            Arc::clone(&database),
            config.role_sync_policy,
        );
        let oauth_client = OAuthCodeClient::new(
            &config.oauth.token_url,
            &config.oauth.identity_url,
            timeout,
        )?;

        Ok(Self {
            config,
            database,
            auth_manager,
            allow_list,
            resolver,
            auth_options,
            masquerade,
            role_syncer,
            oauth_client,
            oauth_states: RwLock::new(HashMap::new()),
        })
    }

    /// Register a pending handshake and return nothing; expired entries are
    /// swept opportunistically
    pub async fn store_handshake_state(&self, state: &str, entry: HandshakeState) {
        let mut states = self.oauth_states.write().await;
        states.insert(state.to_owned(), entry);
        states.retain(|_, s| !s.is_expired());
    }

    /// Validate and consume a handshake state
    ///
    /// Returns `None` for unknown or expired states; the entry is removed
    /// either way so a state can only be used once.
    pub async fn consume_handshake_state(&self, state: &str) -> Option<HandshakeState> {
        let mut states = self.oauth_states.write().await;
        let entry = states.remove(state)?;
        if entry.is_expired() {
            tracing::warn!("OAuth handshake state expired, rejecting");
            return None;
        }
        Some(entry)
    }
}
