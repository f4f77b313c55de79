// ABOUTME: Integration tests for the tenant and user stores
// ABOUTME: Lookup keys, soft-disable, and atomic user upsert semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tribunal Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{identity, make_tenant, test_database};
use tribunal_server::{
    database_plugins::DatabaseProvider,
    models::{ProviderIdentity, RoleGrant, UserRole},
};

#[tokio::test]
async fn test_file_backed_database_is_created_on_demand() {
    use tribunal_server::database_plugins::factory::Database;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tribunal.db");
    let url = format!("sqlite:{}", path.display());

    let database = Database::new(&url).await.unwrap();
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();

    // Reopen the same file and read the record back
    drop(database);
    let reopened = Database::new(&url).await.unwrap();
    let stored = reopened.get_tenant_by_slug("acme").await.unwrap().unwrap();
    assert_eq!(stored.id, tenant.id);
}

#[tokio::test]
async fn test_tenant_lookup_keys() {
    let database = test_database().await;
    let mut tenant = make_tenant("Acme", "acme", "acme-sub");
    tenant.custom_domain = Some("reports.acme.gg".into());
    database.create_tenant(&tenant).await.unwrap();

    let by_slug = database.get_tenant_by_slug("acme").await.unwrap().unwrap();
    assert_eq!(by_slug.id, tenant.id);

    let by_subdomain = database
        .get_tenant_by_subdomain("acme-sub")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_subdomain.id, tenant.id);

    let by_domain = database
        .get_tenant_by_custom_domain("reports.acme.gg")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_domain.id, tenant.id);

    assert!(database.get_tenant_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_slug_is_rejected() {
    let database = test_database().await;
    database.create_tenant(&make_tenant("Acme", "acme", "acme")).await.unwrap();

    let clash = make_tenant("Other", "acme", "other");
    assert!(database.create_tenant(&clash).await.is_err());
}

#[tokio::test]
async fn test_soft_disable_round_trip() {
    let database = test_database().await;
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();

    database.set_tenant_active(tenant.id, false).await.unwrap();
    let stored = database.get_tenant_by_id(tenant.id).await.unwrap().unwrap();
    assert!(!stored.is_active);

    database.set_tenant_active(tenant.id, true).await.unwrap();
    let stored = database.get_tenant_by_id(tenant.id).await.unwrap().unwrap();
    assert!(stored.is_active);
}

#[tokio::test]
async fn test_operator_update_persists_credential_bundle() {
    let database = test_database().await;
    let mut tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();

    tenant.oauth_client_id = Some("rotated-client".into());
    tenant.oauth_client_secret = Some("rotated-secret".into());
    tenant.role_admin = Some("111, 444".into());
    database.update_tenant(&tenant).await.unwrap();

    let stored = database.get_tenant_by_id(tenant.id).await.unwrap().unwrap();
    assert_eq!(stored.oauth_client_id.as_deref(), Some("rotated-client"));
    assert_eq!(stored.role_admin.as_deref(), Some("111, 444"));
}

#[tokio::test]
async fn test_ensure_user_defaults_to_player_and_keeps_role() {
    let database = test_database().await;
    let tenant = make_tenant("Acme", "acme", "acme");
    database.create_tenant(&tenant).await.unwrap();

    let created = database.ensure_user(&identity("ext-1"), tenant.id).await.unwrap();
    assert_eq!(created.role, UserRole::Player);
    assert!(!created.is_admin);

    // Elevate, then re-ensure with a fresh username: role must survive
    database
        .upsert_user_grant(
            &identity("ext-1"),
            tenant.id,
            RoleGrant::from_role(UserRole::Admin),
        )
        .await
        .unwrap();

    let refreshed_identity = ProviderIdentity {
        id: "ext-1".into(),
        username: "renamed".into(),
        avatar: Some("hash".into()),
    };
    let ensured = database.ensure_user(&refreshed_identity, tenant.id).await.unwrap();
    assert_eq!(ensured.username, "renamed");
    assert_eq!(ensured.role, UserRole::Admin);
    assert!(ensured.is_admin);
}

#[tokio::test]
async fn test_same_external_id_is_distinct_per_tenant() {
    let database = test_database().await;
    let tenant_a = make_tenant("A", "a", "a");
    let tenant_b = make_tenant("B", "b", "b");
    database.create_tenant(&tenant_a).await.unwrap();
    database.create_tenant(&tenant_b).await.unwrap();

    database
        .upsert_user_grant(
            &identity("ext-1"),
            tenant_a.id,
            RoleGrant::from_role(UserRole::Admin),
        )
        .await
        .unwrap();
    database
        .upsert_user_grant(
            &identity("ext-1"),
            tenant_b.id,
            RoleGrant::from_role(UserRole::Player),
        )
        .await
        .unwrap();

    // One external identity, one row per tenant, independent roles
    assert_eq!(database.get_user_count().await.unwrap(), 2);
    let in_a = database
        .get_user_by_external("ext-1", tenant_a.id)
        .await
        .unwrap()
        .unwrap();
    let in_b = database
        .get_user_by_external("ext-1", tenant_b.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(in_a.role, UserRole::Admin);
    assert_eq!(in_b.role, UserRole::Player);
}
