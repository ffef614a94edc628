//! Domain HTTP API tests

mod common;

use axum::http::{Method, StatusCode};
use common::{domain_path, domains_path, TestApp, ADMIN};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .request(Method::GET, &domains_path(), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_domain_returns_location() {
    let app = TestApp::new();
    let response = app
        .post(&domains_path(), ADMIN, &json!({ "name": "My Domain" }))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.body["id"].as_str().unwrap();
    assert_eq!(response.body["hrid"], "my-domain");
    assert_eq!(response.body["path"], "/my-domain");
    assert_eq!(response.body["enabled"], false);
    assert_eq!(response.location, Some(domain_path(id)));
}

#[tokio::test]
async fn test_create_duplicate_domain_conflicts() {
    let app = TestApp::new();
    app.create_domain("Shop").await;
    let response = app
        .post(&domains_path(), ADMIN, &json!({ "name": "Shop" }))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_non_member_is_forbidden_before_not_found() {
    let app = TestApp::new();
    let response = app.get(&domain_path("unknown"), "bob").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(&domain_path("unknown"), ADMIN).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Domain [unknown] can not be found.");
}

#[tokio::test]
async fn test_list_domains_is_filtered_sorted_and_paged() {
    let app = TestApp::new();
    let zeta = app.create_domain("Zeta").await;
    app.create_domain("alpha").await;
    app.create_domain("Beta").await;

    let response = app
        .get(&format!("{}?page=0&size=2", domains_path()), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["totalCount"], 3);
    assert_eq!(response.body["currentPage"], 0);
    let names: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "Beta"]);
    assert!(response.body["data"][0].get("oidc").is_none());

    let response = app.get(&format!("{}?q=ZET", domains_path()), ADMIN).await;
    assert_eq!(response.body["totalCount"], 1);
    assert_eq!(response.body["data"][0]["id"], zeta.as_str());

    // A user only sees the domains they are member of
    app.add_domain_member(&zeta, "bob", "domain-user").await;
    let response = app.get(&domains_path(), "bob").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["totalCount"], 1);
    assert_eq!(response.body["data"][0]["name"], "Zeta");
}

#[tokio::test]
async fn test_get_domain_by_hrid() {
    let app = TestApp::new();
    let id = app.create_domain("Human Readable").await;

    let response = app
        .get(&format!("{}/_hrid/human-readable", domains_path()), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], id.as_str());

    let response = app
        .get(&format!("{}/_hrid/missing", domains_path()), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_domain_by_hrid_hides_existence_from_non_members() {
    let app = TestApp::new();
    let id = app.create_domain("Secret Domain").await;

    let existing = app
        .get(&format!("{}/_hrid/secret-domain", domains_path()), "mallory")
        .await;
    let missing = app
        .get(&format!("{}/_hrid/nope", domains_path()), "mallory")
        .await;
    assert_eq!(existing.status, StatusCode::FORBIDDEN);
    assert_eq!(missing.status, StatusCode::FORBIDDEN);

    app.add_domain_member(&id, "reader", "domain-user").await;
    let response = app
        .get(&format!("{}/_hrid/secret-domain", domains_path()), "reader")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], id.as_str());
}

#[tokio::test]
async fn test_patch_domain_requires_every_touched_permission() {
    let app = TestApp::new();
    let id = app.create_domain("Patched").await;
    app.add_domain_member(&id, "reader", "domain-user").await;

    let response = app
        .patch(&domain_path(&id), "reader", &json!({ "name": "Renamed" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .patch(
            &domain_path(&id),
            ADMIN,
            &json!({ "description": "updated", "enabled": true }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["description"], "updated");
    assert_eq!(response.body["enabled"], true);
    assert_eq!(response.body["name"], "Patched");
}

#[tokio::test]
async fn test_domain_entrypoints_use_gateway_url() {
    let app = TestApp::new();
    let id = app.create_domain("Gateway").await;

    let response = app
        .get(&format!("{}/entrypoints", domain_path(&id)), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body[0]["url"],
        "https://gateway.example.com/gateway"
    );
}

#[tokio::test]
async fn test_delete_domain() {
    let app = TestApp::new();
    let id = app.create_domain("Short Lived").await;

    let response = app.delete(&domain_path(&id), ADMIN).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get(&domain_path(&id), ADMIN).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_domain_owner_cannot_delete() {
    let app = TestApp::new();
    let id = app.create_domain("Owned").await;
    app.add_domain_member(&id, "owner", "domain-owner").await;

    let response = app.get(&domain_path(&id), "owner").await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.delete(&domain_path(&id), "owner").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
