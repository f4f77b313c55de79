// ABOUTME: Shared fixtures for integration tests
// ABOUTME: In-memory database, tenant builders, and a fake membership provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use std::sync::Arc;
use tribunal_server::{
    config::{
        AuthConfig, DatabaseConfig, DatabaseUrl, Environment, LogLevel, MasqueradeConfig,
        OAuthConfig, RoleSyncPolicy, ServerConfig,
    },
    database_plugins::{factory::Database, DatabaseProvider},
    external::membership::{MembershipError, MembershipProvider},
    models::{ProviderIdentity, Tenant},
    resources::ServerResources,
};

/// Fresh in-memory database with migrations applied
pub async fn test_database() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("in-memory database should initialize")
}

/// Server configuration for tests
pub fn test_config(super_admins: Vec<String>, policy: RoleSyncPolicy) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        log_level: LogLevel::Info,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
        },
        auth: AuthConfig {
            session_secret: b"integration-test-secret-32-bytes!".to_vec(),
            session_expiry_hours: 24,
            super_admin_ids: super_admins,
        },
        oauth: OAuthConfig {
            default_client_id: Some("platform-client".into()),
            default_client_secret: Some("platform-secret".into()),
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
        role_sync_policy: policy,
    }
}

/// Fully configured tenant with the standard test role mapping
///
/// roleAdmin = "111", roleEvaluator = "222"
pub fn make_tenant(name: &str, slug: &str, subdomain: &str) -> Tenant {
    let mut tenant = Tenant::new(name.to_owned(), slug.to_owned(), subdomain.to_owned());
    tenant.oauth_client_id = Some(format!("{slug}-client"));
    tenant.oauth_client_secret = Some(format!("{slug}-secret"));
    tenant.guild_id = Some(format!("guild-{slug}"));
    tenant.role_admin = Some("111".into());
    tenant.role_evaluator = Some("222".into());
    tenant.role_player = Some("333".into());
    tenant
}

/// Test identity fixture
pub fn identity(id: &str) -> ProviderIdentity {
    ProviderIdentity {
        id: id.to_owned(),
        username: format!("user-{id}"),
        avatar: None,
    }
}

/// Scripted membership provider behavior
#[derive(Debug, Clone)]
pub enum FakeMembership {
    /// Return these role ids
    Roles(Vec<String>),
    /// The user is not a member (HTTP 404)
    NotMember,
    /// The provider rejects our credential (HTTP 401/403)
    CredentialRejected(u16),
    /// The provider is unreachable
    Unavailable,
}

#[async_trait]
impl MembershipProvider for FakeMembership {
    async fn member_roles(
        &self,
        _guild_id: &str,
        _external_user_id: &str,
    ) -> Result<Vec<String>, MembershipError> {
        match self {
            Self::Roles(roles) => Ok(roles.clone()),
            Self::NotMember => Err(MembershipError::NotMember),
            Self::CredentialRejected(status) => Err(MembershipError::CredentialRejected(*status)),
            Self::Unavailable => Err(MembershipError::Unavailable("connection refused".into())),
        }
    }
}

/// Build server resources over a database and a scripted membership provider
pub fn test_resources(
    database: Database,
    membership: FakeMembership,
    super_admins: Vec<String>,
    policy: RoleSyncPolicy,
) -> Arc<ServerResources> {
    let config = test_config(super_admins, policy);
    Arc::new(
        ServerResources::with_membership_provider(config, database, Arc::new(membership))
            .expect("resources should build"),
    )
}
