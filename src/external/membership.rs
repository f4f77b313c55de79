// ABOUTME: Guild membership lookups against the external identity provider
// ABOUTME: Maps HTTP failure classes onto distinct membership error variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Membership provider
//!
//! Role synchronization consumes the provider's membership endpoint
//! (`GET /guilds/{guild_id}/members/{user_id}`). The HTTP failure classes
//! are meaningful and must stay distinct:
//! - 404: the user is not a member of the tenant's guild (misconfiguration
//!   signal, never silently downgraded to PLAYER)
//! - 401/403: our credential is rejected (operator misconfiguration)
//! - 429/5xx/timeout: membership unknown; the sync policy decides

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Membership lookup failure classes
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// The user is not a member of the guild (HTTP 404)
    #[error("user is not a member of the guild")]
    NotMember,
    /// The provider rejected our credential (HTTP 401/403)
    #[error("provider rejected membership credentials (status {0})")]
    CredentialRejected(u16),
    /// The provider is unreachable, rate limited, or erroring
    #[error("membership provider unavailable: {0}")]
    Unavailable(String),
    /// The lookup exceeded its timeout; membership is unknown
    #[error("membership lookup timed out")]
    Timeout,
}

/// Seam for membership lookups
///
/// Implemented over HTTP in production and by in-memory fakes in tests.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Fetch the external role ids a user holds within a guild
    async fn member_roles(
        &self,
        guild_id: &str,
        external_user_id: &str,
    ) -> Result<Vec<String>, MembershipError>;
}

/// Wire shape of a guild member record
#[derive(Debug, Deserialize)]
struct GuildMember {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    user: Option<MemberUser>,
}

#[derive(Debug, Deserialize)]
struct MemberUser {
    id: String,
    username: String,
    #[serde(default)]
    avatar: Option<String>,
}

/// HTTP membership client using a bot/service credential
pub struct HttpMembershipClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl HttpMembershipClient {
    /// Create a new client with a bounded request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, bot_token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            bot_token: bot_token.to_owned(),
        })
    }

    fn member_url(&self, guild_id: &str, external_user_id: &str) -> String {
        format!(
            "{}/guilds/{}/members/{}",
            self.base_url,
            urlencoding::encode(guild_id),
            urlencoding::encode(external_user_id)
        )
    }
}

#[async_trait]
impl MembershipProvider for HttpMembershipClient {
    async fn member_roles(
        &self,
        guild_id: &str,
        external_user_id: &str,
    ) -> Result<Vec<String>, MembershipError> {
        let response = self
            .http
            .get(self.member_url(guild_id, external_user_id))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MembershipError::Timeout
                } else {
                    MembershipError::Unavailable(e.to_string())
                }
            })?;

        match response.status().as_u16() {
            200 => {
                let member: GuildMember = response
                    .json()
                    .await
                    .map_err(|e| MembershipError::Unavailable(format!("invalid body: {e}")))?;
                // The user sub-object is informational here; roles drive sync
                if let Some(user) = &member.user {
                    tracing::debug!(
                        external_id = %user.id,
                        username = %user.username,
                        role_count = member.roles.len(),
                        "fetched guild member"
                    );
                }
                Ok(member.roles)
            }
            404 => Err(MembershipError::NotMember),
            401 | 403 => Err(MembershipError::CredentialRejected(
                response.status().as_u16(),
            )),
            429 => Err(MembershipError::Unavailable("rate limited".into())),
            status => Err(MembershipError::Unavailable(format!(
                "unexpected status {status}"
            ))),
        }
    }
}
