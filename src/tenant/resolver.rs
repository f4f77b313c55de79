// ABOUTME: Derives the active tenant from the request host header
// ABOUTME: Layers the super-admin masquerade override above host-based lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Tenant resolution
//!
//! Resolution precedence, strictly in order:
//! 1. Super-admin masquerade override cookie (slug lookup)
//! 2. Exact custom-domain match on the port-stripped host
//! 3. First host label as subdomain
//!
//! No other request shape is consulted for tenant identity. A host that
//! matches an inactive tenant resolves to `None` - the tenant is invisible,
//! not an error.

use crate::auth::SessionClaims;
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::models::Tenant;
use crate::tenant::masquerade::MasqueradeOverride;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the active tenant for each inbound request
#[derive(Clone)]
pub struct TenantResolver {
    database: Arc<Database>,
}

impl TenantResolver {
    /// Create a new resolver over the tenant store
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Resolve the active tenant for a request
    ///
    /// `None` means "platform root, no tenant context" - callers decide
    /// whether that is acceptable for the route.
    ///
    /// # Errors
    ///
    /// Returns an error only on tenant store failures; a missing or inactive
    /// tenant is a `None`, never an error.
    pub async fn resolve(
        &self,
        host_header: Option<&str>,
        override_cookie: Option<&MasqueradeOverride>,
        session_claims: Option<&SessionClaims>,
    ) -> Result<Option<Tenant>> {
        // Masquerade override wins, but only for super-admins. A cookie
        // presented by anyone else is ignored and resolution falls through
        // to the host header.
        if let Some(override_cookie) = override_cookie {
            let is_super_admin = session_claims.is_some_and(|c| c.is_super_admin);
            if is_super_admin {
                if let Some(tenant) = self.resolve_override(override_cookie).await? {
                    return Ok(Some(tenant));
                }
            } else {
                warn!(
                    target_slug = %override_cookie.target_slug,
                    "masquerade override cookie present without super-admin claims, ignoring"
                );
            }
        }

        let Some(host) = host_header else {
            debug!("no host header present, resolving to platform root");
            return Ok(None);
        };

        self.resolve_host(host).await
    }

    /// Resolve the override cookie target, hiding unknown or inactive tenants
    async fn resolve_override(
        &self,
        override_cookie: &MasqueradeOverride,
    ) -> Result<Option<Tenant>> {
        let tenant = self
            .database
            .get_tenant_by_slug(&override_cookie.target_slug)
            .await?;
        match tenant {
            Some(tenant) if tenant.is_active => Ok(Some(tenant)),
            Some(tenant) => {
                warn!(slug = %tenant.slug, "masquerade target tenant is inactive, ignoring override");
                Ok(None)
            }
            None => {
                warn!(
                    slug = %override_cookie.target_slug,
                    "masquerade target tenant does not exist, ignoring override"
                );
                Ok(None)
            }
        }
    }

    /// Resolve a tenant from the host header alone
    async fn resolve_host(&self, host: &str) -> Result<Option<Tenant>> {
        let host = strip_port(host);
        if host.is_empty() {
            return Ok(None);
        }

        // Custom domains take precedence over platform subdomains
        if let Some(tenant) = self.database.get_tenant_by_custom_domain(host).await? {
            return Ok(active_or_none(tenant));
        }

        let Some(subdomain) = first_label(host) else {
            return Ok(None);
        };

        match self.database.get_tenant_by_subdomain(subdomain).await? {
            Some(tenant) => Ok(active_or_none(tenant)),
            None => {
                debug!(host = %host, "no tenant matches host, resolving to platform root");
                Ok(None)
            }
        }
    }
}

/// Inactive tenants are treated as no-match
fn active_or_none(tenant: Tenant) -> Option<Tenant> {
    if tenant.is_active {
        Some(tenant)
    } else {
        debug!(slug = %tenant.slug, "tenant is inactive, treating as no-match");
        None
    }
}

/// Strip an optional port suffix from a host header value
///
/// Handles bracketed IPv6 literals (`[::1]:8080`) as well as plain
/// `host:port` pairs.
fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if let Some(rest) = host.strip_prefix('[') {
        // IPv6 literal: everything up to the closing bracket
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// First DNS label of the host, used as the subdomain candidate
///
/// A bare single-label host has no subdomain to extract.
fn first_label(host: &str) -> Option<&str> {
    let (label, rest) = host.split_once('.')?;
    if label.is_empty() || rest.is_empty() {
        None
    } else {
        Some(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("acme.platform.test:443"), "acme.platform.test");
        assert_eq!(strip_port("acme.platform.test"), "acme.platform.test");
        assert_eq!(strip_port("localhost:8081"), "localhost");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port(" acme.test "), "acme.test");
    }

    #[test]
    fn test_first_label() {
        assert_eq!(first_label("acme.platform.test"), Some("acme"));
        assert_eq!(first_label("reports.acme.gg"), Some("reports"));
        assert_eq!(first_label("localhost"), None);
        assert_eq!(first_label(".platform.test"), None);
    }
}
