// ABOUTME: Middleware extracting session claims from cookie or bearer token
// ABOUTME: Injects ExtractedClaims into request extensions for route handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Session claims middleware
//!
//! Extracts and validates the session token from the `tribunal_session`
//! cookie (web clients) or the `Authorization: Bearer` header (API
//! clients). The middleware does NOT reject unauthenticated requests;
//! it injects `ExtractedClaims(None)` and leaves the decision to route
//! guards.

use crate::auth::SessionClaims;
use crate::resources::ServerResources;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "tribunal_session";

/// Extracted session claims wrapper for request extensions
///
/// Contains `Option<SessionClaims>` because public routes carry no
/// authentication and token validation may fail gracefully.
#[derive(Debug, Clone)]
pub struct ExtractedClaims(pub Option<SessionClaims>);

impl ExtractedClaims {
    /// Get the claims if present
    #[must_use]
    pub const fn get(&self) -> Option<&SessionClaims> {
        self.0.as_ref()
    }
}

/// Read a cookie value from the request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

/// Session claims middleware
///
/// 1. Extracts the session token from cookie or `Authorization` header
/// 2. Validates the token signature and expiry
/// 3. Injects `ExtractedClaims` into request extensions
pub async fn session_claims_middleware(
    State(resources): State<Arc<ServerResources>>,
    mut req: Request,
    next: Next,
) -> Response {
    let headers = req.headers();

    // Cookie first (web clients), then Authorization header (API clients)
    let token = get_cookie_value(headers, SESSION_COOKIE).or_else(|| {
        headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .map(ToOwned::to_owned)
    });

    let claims = token.and_then(|token| {
        resources
            .auth_manager
            .validate_token(&token)
            .map_err(|e| {
                debug!("session token validation failed: {}", e);
            })
            .ok()
    });

    req.extensions_mut().insert(ExtractedClaims(claims));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("a=1; tribunal_session=tok.en.value; b=2"),
        );
        assert_eq!(
            get_cookie_value(&headers, SESSION_COOKIE),
            Some("tok.en.value".to_owned())
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
        assert_eq!(get_cookie_value(&HeaderMap::new(), SESSION_COOKIE), None);
    }
}
