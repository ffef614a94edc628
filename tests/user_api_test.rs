//! User HTTP API tests

mod common;

use axum::http::StatusCode;
use common::{domain_path, TestApp, ADMIN};
use pretty_assertions::assert_eq;
use serde_json::json;

fn users_path(domain: &str) -> String {
    format!("{}/users", domain_path(domain))
}

async fn create_user(app: &TestApp, domain: &str, username: &str) -> String {
    let response = app
        .post(
            &users_path(domain),
            ADMIN,
            &json!({
                "username": username,
                "password": "Initial-Passw0rd",
                "email": format!("{}@example.com", username)
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_user_in_default_provider() {
    let app = TestApp::new();
    let domain = app.create_domain("People").await;

    let response = app
        .post(
            &users_path(&domain),
            ADMIN,
            &json!({ "username": "jdoe", "password": "Initial-Passw0rd" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["source"], format!("default-idp-{}", domain));
    assert!(response.body.get("passwordHash").is_none());
    let id = response.body["id"].as_str().unwrap();
    assert_eq!(
        response.location,
        Some(format!("{}/{}", users_path(&domain), id))
    );

    let response = app
        .post(
            &users_path(&domain),
            ADMIN,
            &json!({ "username": "jdoe", "password": "Other-Passw0rd" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_user_requires_password_unless_pre_registered() {
    let app = TestApp::new();
    let domain = app.create_domain("Registration").await;

    let response = app
        .post(&users_path(&domain), ADMIN, &json!({ "username": "nopass" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Field [password] is required");

    let response = app
        .post(
            &users_path(&domain),
            ADMIN,
            &json!({ "username": "invited", "preRegistration": true }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["enabled"], false);
    assert_eq!(response.body["registrationCompleted"], false);
}

#[tokio::test]
async fn test_create_user_validates_input() {
    let app = TestApp::new();
    let domain = app.create_domain("Validation").await;

    let response = app
        .post(
            &users_path(&domain),
            ADMIN,
            &json!({ "username": "bad", "email": "not-an-email" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post(
            &users_path(&domain),
            ADMIN,
            &json!({ "username": "orphan", "source": "unknown-idp" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_users_with_pagination() {
    let app = TestApp::new();
    let domain = app.create_domain("Search").await;
    for username in ["carol", "alice", "bob"] {
        create_user(&app, &domain, username).await;
    }

    let response = app
        .get(&format!("{}?page=1&size=2", users_path(&domain)), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["totalCount"], 3);
    assert_eq!(response.body["currentPage"], 1);
    assert_eq!(response.body["data"][0]["username"], "carol");

    let response = app
        .get(&format!("{}?q=ali", users_path(&domain)), ADMIN)
        .await;
    assert_eq!(response.body["totalCount"], 1);
    assert_eq!(response.body["data"][0]["username"], "alice");

    let response = app
        .get(&format!("{}?page=-1", users_path(&domain)), ADMIN)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_status_lock_and_unlock() {
    let app = TestApp::new();
    let domain = app.create_domain("Lifecycle").await;
    let user = create_user(&app, &domain, "locked").await;
    let path = format!("{}/{}", users_path(&domain), user);

    let response = app
        .put(&format!("{}/status", path), ADMIN, &json!({ "enabled": false }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["enabled"], false);

    let response = app.post(&format!("{}/lock", path), ADMIN, &json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["accountNonLocked"], false);

    let response = app
        .post(&format!("{}/unlock", path), ADMIN, &json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["accountNonLocked"], true);
}

#[tokio::test]
async fn test_reset_password_follows_default_policy() {
    let app = TestApp::new();
    let domain = app.create_domain("Passwords").await;
    let user = create_user(&app, &domain, "resetme").await;

    let response = app
        .post(
            &format!("{}/password-policies", domain_path(&domain)),
            ADMIN,
            &json!({ "name": "Strict", "minLength": 12, "includeNumbers": true }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["defaultPolicy"], true);

    let reset = format!("{}/{}/resetPassword", users_path(&domain), user);
    let response = app.post(&reset, ADMIN, &json!({ "password": "short1" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(&reset, ADMIN, &json!({ "password": "long-enough-passw0rd" }))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_update_username_and_delete() {
    let app = TestApp::new();
    let domain = app.create_domain("Renames").await;
    let user = create_user(&app, &domain, "before").await;
    create_user(&app, &domain, "taken").await;
    let path = format!("{}/{}", users_path(&domain), user);

    let response = app
        .patch(&format!("{}/username", path), ADMIN, &json!({ "username": "taken" }))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .patch(&format!("{}/username", path), ADMIN, &json!({ "username": "after" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "after");

    let response = app.delete(&path, ADMIN).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = app.get(&path, ADMIN).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
