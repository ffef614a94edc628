//! HTTP test infrastructure
//!
//! Builds the production router over a freshly seeded in-memory state and
//! exposes request helpers that attach management tokens.

#![allow(dead_code)]

use am_management::config::{
    BootstrapConfig, Config, CorsConfig, JwtConfig, SecurityHeadersConfig, TelemetryConfig,
};
use am_management::server::{build_router, AppState};
use am_management::state::HasServices;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

pub const ORG: &str = "DEFAULT";
pub const ENV: &str = "DEFAULT";
pub const ADMIN: &str = "admin";

pub fn create_test_config() -> Config {
    Config {
        environment: "test".to_string(),
        http_host: "127.0.0.1".to_string(),
        http_port: 8093,
        gateway_url: "https://gateway.example.com/".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-key-for-http-testing".to_string(),
            issuer: "https://am.test".to_string(),
            audience: "am-management".to_string(),
            token_ttl_secs: 3600,
            private_key_pem: None,
            public_key_pem: None,
        },
        bootstrap: BootstrapConfig::default(),
        cors: CorsConfig::default(),
        telemetry: TelemetryConfig::default(),
        security_headers: SecurityHeadersConfig::default(),
    }
}

/// Response captured by the helpers
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(create_test_config()).unwrap();
        let router = build_router(state.clone());
        Self { state, router }
    }

    /// Management token for `user_id` in the bootstrap organization
    pub fn token(&self, user_id: &str) -> String {
        self.state
            .jwt_manager()
            .create_management_token(user_id, user_id, None, ORG)
            .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token(user)),
            );
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            body,
        }
    }

    pub async fn get(&self, path: &str, user: &str) -> TestResponse {
        self.request(Method::GET, path, Some(user), None).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, user: &str, body: &T) -> TestResponse {
        let body = serde_json::to_value(body).unwrap();
        self.request(Method::POST, path, Some(user), Some(body)).await
    }

    pub async fn put<T: Serialize>(&self, path: &str, user: &str, body: &T) -> TestResponse {
        let body = serde_json::to_value(body).unwrap();
        self.request(Method::PUT, path, Some(user), Some(body)).await
    }

    pub async fn patch<T: Serialize>(&self, path: &str, user: &str, body: &T) -> TestResponse {
        let body = serde_json::to_value(body).unwrap();
        self.request(Method::PATCH, path, Some(user), Some(body)).await
    }

    pub async fn delete(&self, path: &str, user: &str) -> TestResponse {
        self.request(Method::DELETE, path, Some(user), None).await
    }

    /// Create a domain as the bootstrap administrator and return its id
    pub async fn create_domain(&self, name: &str) -> String {
        let response = self
            .post(&domains_path(), ADMIN, &serde_json::json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Grant `role` on a domain to `user` through the members endpoint
    pub async fn add_domain_member(&self, domain: &str, user: &str, role: &str) {
        let response = self
            .post(
                &format!("{}/members", domain_path(domain)),
                ADMIN,
                &serde_json::json!({ "memberId": user, "memberType": "USER", "role": role }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    }
}

pub fn domains_path() -> String {
    format!(
        "/management/organizations/{}/environments/{}/domains",
        ORG, ENV
    )
}

pub fn domain_path(domain: &str) -> String {
    format!("{}/{}", domains_path(), domain)
}
