// ABOUTME: Integration tests for permission evaluation over synced users
// ABOUTME: Cross-tenant isolation and super-admin bypass end to end
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
    database_plugins::DatabaseProvider,
    permissions,
};

fn set_of(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|s| (*s).to_owned()).collect()
}

#[tokio::test]
async fn test_staff_rights_never_cross_tenants() {
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

    // Staff (admin, even) of tenant A
    let user = resources
        .role_syncer
        .sync(&identity("ext-1"), &set_of(&["111"]), &tenant_a)
        .await
        .unwrap();
    let claims = resources
        .auth_manager
        .build_claims(&user, Some(&tenant_a), &resources.allow_list)
        .unwrap();

    assert!(permissions::is_staff(&claims));
    assert!(permissions::can_access_tenant_admin_area(&claims, &tenant_a));
    // The single most safety-critical invariant: rights from A are void in B
    assert!(!permissions::can_access_tenant_admin_area(&claims, &tenant_b));
}

#[tokio::test]
async fn test_player_cannot_access_admin_area_of_own_tenant() {
    let database = test_database().await;
    let tenant = make_tenant("A", "a", "a");
    database.create_tenant(&tenant).await.unwrap();
    let resources = test_resources(
        database,
        FakeMembership::Roles(vec![]),
        vec![],
        RoleSyncPolicy::RetainOnFailure,
    );

    let user = resources
        .role_syncer
        .sync(&identity("ext-2"), &set_of(&["999"]), &tenant)
        .await
        .unwrap();
    let claims = resources
        .auth_manager
        .build_claims(&user, Some(&tenant), &resources.allow_list)
        .unwrap();

    assert!(permissions::is_authenticated(Some(&claims)));
    assert!(!permissions::is_staff(&claims));
    assert!(!permissions::can_access_tenant_admin_area(&claims, &tenant));
}

#[tokio::test]
async fn test_super_admin_bypasses_every_tenant_binding() {
    let database = test_database().await;
    let tenant_a = make_tenant("A", "a", "a");
    let tenant_b = make_tenant("B", "b", "b");
    database.create_tenant(&tenant_a).await.unwrap();
    database.create_tenant(&tenant_b).await.unwrap();
    let resources = test_resources(
        database,
        FakeMembership::Roles(vec![]),
        vec!["root-1".into()],
        RoleSyncPolicy::RetainOnFailure,
    );

    let claims = resources
        .auth_manager
        .build_bootstrap_claims(&identity("root-1"), &resources.allow_list);

    assert!(claims.tenant_id.is_nil());
    assert!(permissions::can_access_tenant_admin_area(&claims, &tenant_a));
    assert!(permissions::can_access_tenant_admin_area(&claims, &tenant_b));
}
