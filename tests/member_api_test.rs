//! Membership HTTP API tests

mod common;

use axum::http::StatusCode;
use common::{domain_path, TestApp, ADMIN};
use pretty_assertions::assert_eq;
use serde_json::json;

fn members_path(domain: &str) -> String {
    format!("{}/members", domain_path(domain))
}

#[tokio::test]
async fn test_list_domain_members_with_metadata() {
    let app = TestApp::new();
    let domain = app.create_domain("Members").await;
    app.add_domain_member(&domain, "bob", "domain-user").await;

    let response = app.get(&members_path(&domain), ADMIN).await;
    assert_eq!(response.status, StatusCode::OK);

    let memberships = response.body["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 2);
    assert!(memberships
        .iter()
        .any(|m| m["memberId"] == "bob" && m["role"] == "domain-user"));
    assert!(memberships
        .iter()
        .any(|m| m["memberId"] == ADMIN && m["role"] == "domain-primary-owner"));
    assert!(response.body["metadata"]["roles"]
        .get("domain-user")
        .is_some());
}

#[tokio::test]
async fn test_add_member_rejects_reserved_and_mismatched_roles() {
    let app = TestApp::new();
    let domain = app.create_domain("Roles").await;

    let response = app
        .post(
            &members_path(&domain),
            ADMIN,
            &json!({ "memberId": "bob", "memberType": "USER", "role": "domain-primary-owner" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &members_path(&domain),
            ADMIN,
            &json!({ "memberId": "bob", "memberType": "USER", "role": "application-user" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &members_path(&domain),
            ADMIN,
            &json!({ "memberId": "bob", "memberType": "USER", "role": "unknown-role" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_adding_member_twice_updates_role() {
    let app = TestApp::new();
    let domain = app.create_domain("Upsert").await;
    app.add_domain_member(&domain, "bob", "domain-user").await;
    app.add_domain_member(&domain, "bob", "domain-owner").await;

    let response = app.get(&members_path(&domain), ADMIN).await;
    let bob: Vec<_> = response.body["memberships"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["memberId"] == "bob")
        .collect();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0]["role"], "domain-owner");
}

#[tokio::test]
async fn test_remove_member() {
    let app = TestApp::new();
    let domain = app.create_domain("Removal").await;
    let response = app
        .post(
            &members_path(&domain),
            ADMIN,
            &json!({ "memberId": "bob", "memberType": "USER", "role": "domain-user" }),
        )
        .await;
    let membership = response.body["id"].as_str().unwrap().to_string();

    let response = app
        .delete(&format!("{}/{}", members_path(&domain), membership), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app
        .delete(&format!("{}/{}", members_path(&domain), membership), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body["message"],
        format!("Membership [{}] can not be found.", membership)
    );

    // Bob lost access with the membership
    let response = app.get(&domain_path(&domain), "bob").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_permissions_are_merged() {
    let app = TestApp::new();
    let domain = app.create_domain("Permissions").await;
    app.add_domain_member(&domain, "bob", "domain-user").await;

    let response = app
        .get(&format!("{}/permissions", members_path(&domain)), "bob")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["DOMAIN"], json!(["READ", "LIST"]));
    assert!(response.body.get("ORGANIZATION").is_none());

    let response = app
        .get(&format!("{}/permissions", members_path(&domain)), ADMIN)
        .await;
    assert_eq!(
        response.body["DOMAIN"],
        json!(["CREATE", "READ", "LIST", "UPDATE", "DELETE"])
    );
}

#[tokio::test]
async fn test_member_permissions_for_unknown_domain() {
    let app = TestApp::new();
    let response = app
        .get(&format!("{}/permissions", members_path("missing")), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
