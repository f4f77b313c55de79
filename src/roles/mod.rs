// ABOUTME: Role synchronization mapping external guild roles onto internal tiers
// ABOUTME: Priority mapping, idempotent upserts, and membership failure policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

//! Role synchronization
//!
//! Maps a user's external guild role ids onto the internal three-tier role
//! enum. The decision order is a priority, not a union: an intersection
//! with the tenant's admin set wins outright, then evaluator, else player.
//!
//! Sync is idempotent and runs on demand only - at sign-in or through an
//! explicit re-sync request, never from a background poller. An active
//! session is unaffected until its claims are rebuilt.

use crate::config::RoleSyncPolicy;
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use crate::external::membership::{MembershipError, MembershipProvider};
use crate::models::{ProviderIdentity, RoleGrant, Tenant, User, UserRole};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Parse a comma-separated external role id list
///
/// Whitespace around each id is trimmed; empty entries never match, so an
/// unconfigured tier (`None` or `""`) produces an empty set.
#[must_use]
pub fn parse_role_ids(raw: Option<&str>) -> HashSet<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Map an external role set onto an internal grant for a tenant
///
/// First match wins: admin, then evaluator, else player.
#[must_use]
pub fn grant_for(external_role_ids: &HashSet<String>, tenant: &Tenant) -> RoleGrant {
    let admin_ids = parse_role_ids(tenant.role_admin.as_deref());
    if !admin_ids.is_disjoint(external_role_ids) {
        return RoleGrant::from_role(UserRole::Admin);
    }

    let evaluator_ids = parse_role_ids(tenant.role_evaluator.as_deref());
    if !evaluator_ids.is_disjoint(external_role_ids) {
        return RoleGrant::from_role(UserRole::Evaluator);
    }

    RoleGrant::from_role(UserRole::Player)
}

/// Synchronizes external membership into stored user roles
#[derive(Clone)]
pub struct RoleSyncer {
    membership: Arc<dyn MembershipProvider>,
    database: Arc<Database>,
    policy: RoleSyncPolicy,
}

impl RoleSyncer {
    /// Create a new syncer
    #[must_use]
    pub fn new(
        membership: Arc<dyn MembershipProvider>,
        database: Arc<Database>,
        policy: RoleSyncPolicy,
    ) -> Self {
        Self {
            membership,
            database,
            policy,
        }
    }

    /// Apply a known external role set to the stored user record
    ///
    /// The upsert is a single atomic statement keyed on
    /// (`external_id`, `tenant_id`); re-running with the same role set
    /// yields the same stored state.
    ///
    /// # Errors
    ///
    /// Returns a database error if the upsert fails.
    pub async fn sync(
        &self,
        identity: &ProviderIdentity,
        external_role_ids: &HashSet<String>,
        tenant: &Tenant,
    ) -> AppResult<User> {
        let grant = grant_for(external_role_ids, tenant);
        let user = self
            .database
            .upsert_user_grant(identity, tenant.id, grant)
            .await
            .map_err(|e| AppError::database(format!("role upsert failed: {e}")))?;

        info!(
            external_id = %identity.id,
            tenant = %tenant.slug,
            role = %user.role,
            "synchronized user role"
        );
        Ok(user)
    }

    /// Fetch membership from the provider and synchronize the stored role
    ///
    /// Failure behavior follows the configured policy:
    /// - a 404 (not a member) or credential rejection is always surfaced -
    ///   it signals tenant misconfiguration, not a missing role
    /// - an unreachable provider retains the stored role for existing users
    ///   under `RetainOnFailure`, and hard-denies under `DenyOnFailure`
    /// - a brand-new user is created as `PLAYER` on lookup failure, never
    ///   with an elevated role
    ///
    /// # Errors
    ///
    /// Returns external-service errors per the policy above, or a database
    /// error if persistence fails.
    pub async fn sync_from_provider(
        &self,
        identity: &ProviderIdentity,
        tenant: &Tenant,
    ) -> AppResult<User> {
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

        match self.membership.member_roles(guild_id, &identity.id).await {
            Ok(roles) => {
                let role_set: HashSet<String> = roles.into_iter().collect();
                self.sync(identity, &role_set, tenant).await
            }
            Err(MembershipError::NotMember) => {
                warn!(
                    external_id = %identity.id,
                    tenant = %tenant.slug,
                    "user is not a member of the tenant guild"
                );
                Err(AppError::external_service(
                    "membership",
                    format!(
                        "user {} is not a member of guild {guild_id}",
                        identity.id
                    ),
                ))
            }
            Err(MembershipError::CredentialRejected(status)) => {
                warn!(
                    tenant = %tenant.slug,
                    status,
                    "membership credentials rejected by provider"
                );
                Err(AppError::external_auth(
                    "membership",
                    format!("provider rejected credentials with status {status}"),
                ))
            }
            Err(err @ (MembershipError::Unavailable(_) | MembershipError::Timeout)) => {
                self.handle_unavailable(identity, tenant, &err).await
            }
        }
    }

    /// Membership unknown: apply the configured failure policy
    async fn handle_unavailable(
        &self,
        identity: &ProviderIdentity,
        tenant: &Tenant,
        err: &MembershipError,
    ) -> AppResult<User> {
        if self.policy == RoleSyncPolicy::DenyOnFailure {
            warn!(
                external_id = %identity.id,
                tenant = %tenant.slug,
                error = %err,
                "membership unknown and policy is deny-on-failure"
            );
            return Err(AppError::external_unavailable("membership", err.to_string()));
        }

        let existing = self
            .database
            .get_user_by_external(&identity.id, tenant.id)
            .await
            .map_err(|e| AppError::database(format!("user lookup failed: {e}")))?;

        if let Some(user) = existing {
            // Fail-open on existing grants: the last-known role stands
            warn!(
                external_id = %identity.id,
                tenant = %tenant.slug,
                role = %user.role,
                error = %err,
                "membership unknown, retaining previously stored role"
            );
            return Ok(user);
        }

        // Fail-closed on first-ever grant: an unknown new user starts at
        // the lowest tier, never elevated
        warn!(
            external_id = %identity.id,
            tenant = %tenant.slug,
            error = %err,
            "membership unknown for new user, creating with default role"
        );
        self.database
            .ensure_user(identity, tenant.id)
            .await
            .map_err(|e| AppError::database(format!("user creation failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant_with_roles(admin: &str, evaluator: &str) -> Tenant {
        let mut tenant = Tenant::new("Acme".into(), "acme".into(), "acme".into());
        tenant.role_admin = Some(admin.to_owned());
        tenant.role_evaluator = Some(evaluator.to_owned());
        tenant
    }

    fn set_of(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_parse_trims_and_drops_empties() {
        let ids = parse_role_ids(Some(" 111 , 222,, 333 "));
        assert_eq!(ids, set_of(&["111", "222", "333"]));
        assert!(parse_role_ids(Some("")).is_empty());
        assert!(parse_role_ids(Some(" , ,")).is_empty());
        assert!(parse_role_ids(None).is_empty());
    }

    #[test]
    fn test_admin_wins_over_evaluator() {
        let tenant = tenant_with_roles("111", "222");
        let grant = grant_for(&set_of(&["111", "222"]), &tenant);
        assert_eq!(grant.role, UserRole::Admin);
        assert!(grant.is_admin);
    }

    #[test]
    fn test_evaluator_membership_grants_evaluator() {
        let tenant = tenant_with_roles("111", "222");
        let grant = grant_for(&set_of(&["222"]), &tenant);
        assert_eq!(grant.role, UserRole::Evaluator);
        assert!(!grant.is_admin);
    }

    #[test]
    fn test_no_intersection_defaults_to_player() {
        let tenant = tenant_with_roles("111", "222");
        let grant = grant_for(&set_of(&["999"]), &tenant);
        assert_eq!(grant.role, UserRole::Player);
        assert!(!grant.is_admin);
    }

    #[test]
    fn test_multi_id_sets_match_any() {
        let tenant = tenant_with_roles("111, 444", "222, 555");
        assert_eq!(grant_for(&set_of(&["444"]), &tenant).role, UserRole::Admin);
        assert_eq!(
            grant_for(&set_of(&["555"]), &tenant).role,
            UserRole::Evaluator
        );
    }

    #[test]
    fn test_empty_configured_ids_never_match() {
        // A tenant with no configured admin ids cannot mint admins, even if
        // the provider hands back an empty-string role id
        let tenant = tenant_with_roles("", "222");
        let grant = grant_for(&set_of(&[""]), &tenant);
        assert_eq!(grant.role, UserRole::Player);
    }
}
