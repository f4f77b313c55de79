// ABOUTME: OAuth code exchange and identity fetch against the external provider
// ABOUTME: Stateless per-request client; credentials come from AuthOptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! OAuth code client
//!
//! The client itself holds no credentials: client id and secret arrive with
//! the per-request [`AuthOptions`](crate::tenant::AuthOptions), so nothing
//! OAuth-related is shared across tenants.

use crate::errors::{AppError, AppResult};
use crate::models::ProviderIdentity;
use crate::tenant::AuthOptions;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Identity endpoint response
#[derive(Debug, Deserialize)]
struct IdentityResponse {
    id: String,
    username: String,
    #[serde(default)]
    avatar: Option<String>,
}

/// Stateless OAuth client for the code-exchange leg of the handshake
#[derive(Clone)]
pub struct OAuthCodeClient {
    http: reqwest::Client,
    token_url: String,
    identity_url: String,
}

impl OAuthCodeClient {
    /// Create a new client with a bounded request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(token_url: &str, identity_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            token_url: token_url.to_owned(),
            identity_url: identity_url.to_owned(),
        })
    }

    /// Exchange an authorization code for an access token
    ///
    /// # Errors
    ///
    /// Returns an external-service error when the provider rejects the code
    /// or is unreachable.
    pub async fn exchange_code(&self, options: &AuthOptions, code: &str) -> AppResult<String> {
        let params = [
            ("client_id", options.client_id.as_str()),
            ("client_secret", options.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", options.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("oauth", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                "oauth",
                format!("code exchange failed with status {}", response.status()),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service("oauth", format!("invalid token body: {e}")))?;

        debug!(token_type = ?token.token_type, "exchanged authorization code");
        Ok(token.access_token)
    }

    /// Fetch the authenticated user's identity
    ///
    /// # Errors
    ///
    /// Returns an external-service error when the provider rejects the
    /// access token or is unreachable.
    pub async fn fetch_identity(&self, access_token: &str) -> AppResult<ProviderIdentity> {
        let response = self
            .http
            .get(&self.identity_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("oauth", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                "oauth",
                format!("identity fetch failed with status {}", response.status()),
            ));
        }

        let identity: IdentityResponse = response.json().await.map_err(|e| {
            AppError::external_service("oauth", format!("invalid identity body: {e}"))
        })?;

        Ok(ProviderIdentity {
            id: identity.id,
            username: identity.username,
            avatar: identity.avatar,
        })
    }
}
