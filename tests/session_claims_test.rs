// ABOUTME: Integration tests for session claims construction and invariants
// ABOUTME: Tenant binding, super-admin sourcing, and invariant violation handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{identity, make_tenant, test_database, test_resources, FakeMembership};
use std::collections::HashSet;
use tribunal_server::{
    config::RoleSyncPolicy,
    database_plugins::{factory::Database, DatabaseProvider},
    errors::ErrorCode,
    models::UserRole,
};

fn set_of(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|s| (*s).to_owned()).collect()
}

#[tokio::test]
async fn test_claims_bind_tenant_at_sign_in() {
    let database = test_database().await;
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();
    let resources = test_resources(
        database,
        FakeMembership::Roles(vec![]),
        vec![],
        RoleSyncPolicy::RetainOnFailure,
    );

    let user = resources
        .role_syncer
        .sync(&identity("ext-1"), &set_of(&["111"]), &tenant)
        .await
        .unwrap();
    let claims = resources
        .auth_manager
        .build_claims(&user, Some(&tenant), &resources.allow_list)
        .unwrap();

    assert_eq!(claims.tenant_id, tenant.id);
    assert_eq!(claims.role, UserRole::Admin);
    assert!(claims.is_admin);
    // Tenant admin does not imply platform super-admin
    assert!(!claims.is_super_admin);
}

#[tokio::test]
async fn test_claims_for_wrong_tenant_are_refused() {
    let database = test_database().await;
    let tenant_a = make_tenant("A", "a", "a");
    let tenant_b = make_tenant("B", "b", "b");
    database.create_tenant(&tenant_a).await.unwrap();
    database.create_tenant(&tenant_b).await.unwrap();
    let resources = test_resources(
        database,
        FakeMembership::Roles(vec![]),
        vec![],
        RoleSyncPolicy::RetainOnFailure,
    );

    let user = resources
        .role_syncer
        .sync(&identity("ext-1"), &set_of(&["111"]), &tenant_a)
        .await
        .unwrap();

    // A user row from tenant A can never be issued claims under tenant B
    let err = resources
        .auth_manager
        .build_claims(&user, Some(&tenant_b), &resources.allow_list)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvariantViolation);
}

#[tokio::test]
async fn test_corrupted_role_state_is_a_hard_denial() {
    let database = test_database().await;
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();
    let resources = test_resources(
        database.clone(),
        FakeMembership::Roles(vec![]),
        vec![],
        RoleSyncPolicy::RetainOnFailure,
    );

    resources
        .role_syncer
        .sync(&identity("ext-1"), &set_of(&["111"]), &tenant)
        .await
        .unwrap();

    // Corrupt the stored row directly: role says ADMIN, flag says no
    let Database::SQLite(sqlite) = &database;
    sqlx::query("UPDATE users SET is_admin = 0 WHERE external_id = ?")
        .bind("ext-1")
        .execute(sqlite.pool())
        .await
        .unwrap();

    let user = resources
        .database
        .get_user_by_external("ext-1", tenant.id)
        .await
        .unwrap()
        .unwrap();

    // The builder refuses; it never silently picks the more permissive read
    let err = resources
        .auth_manager
        .build_claims(&user, Some(&tenant), &resources.allow_list)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvariantViolation);
}

#[tokio::test]
async fn test_super_admin_flag_is_independent_of_role_sync() {
    let database = test_database().await;
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();
    // "ext-1" is allow-listed; the membership gives no elevated role
    let resources = test_resources(
        database,
        FakeMembership::Roles(vec![]),
        vec!["ext-1".into()],
        RoleSyncPolicy::RetainOnFailure,
    );

    let user = resources
        .role_syncer
        .sync(&identity("ext-1"), &set_of(&[]), &tenant)
        .await
        .unwrap();
    let claims = resources
        .auth_manager
        .build_claims(&user, Some(&tenant), &resources.allow_list)
        .unwrap();

    // Lowest tenant role, yet platform super-admin
    assert_eq!(claims.role, UserRole::Player);
    assert!(claims.is_super_admin);
}

#[tokio::test]
async fn test_token_round_trip_preserves_tenant_binding() {
    let database = test_database().await;
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();
    let resources = test_resources(
        database,
        FakeMembership::Roles(vec![]),
        vec![],
        RoleSyncPolicy::RetainOnFailure,
    );

    let user = resources
        .role_syncer
        .sync(&identity("ext-1"), &set_of(&["222"]), &tenant)
        .await
        .unwrap();
    let claims = resources
        .auth_manager
        .build_claims(&user, Some(&tenant), &resources.allow_list)
        .unwrap();
    let token = resources.auth_manager.generate_token(&claims).unwrap();
    let decoded = resources.auth_manager.validate_token(&token).unwrap();

    assert_eq!(decoded.tenant_id, tenant.id);
    assert_eq!(decoded.sub, "ext-1");
    assert_eq!(decoded.role, UserRole::Evaluator);
}
