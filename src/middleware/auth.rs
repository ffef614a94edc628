//! JWT authentication extractor
//!
//! Provides the `AuthUser` extractor used by every management handler to
//! resolve the calling principal from a bearer token.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::jwt::ManagementClaims;
use crate::state::HasServices;

/// Authenticated organization user extracted from a management token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User id from the token's `sub` claim
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    /// Organization the token was issued for
    pub organization_id: String,
}

impl AuthUser {
    pub fn from_claims(claims: ManagementClaims) -> Result<Self, AuthError> {
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("Missing subject in token".to_string()));
        }

        Ok(Self {
            user_id: claims.sub,
            username: claims.username,
            display_name: claims.display_name,
            organization_id: claims.org,
        })
    }

    /// Name recorded in audits and membership metadata
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidHeader(_) => "Invalid authorization header",
            AuthError::InvalidToken(_) => "Invalid or expired token",
        };

        let body = serde_json::json!({
            "error": message,
            "code": "UNAUTHORIZED"
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Extract and validate Bearer token from Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::InvalidHeader("Authorization header must use Bearer scheme".to_string())
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let claims = state
            .jwt_manager()
            .verify_management_token(token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected management token");
                AuthError::InvalidToken(e.to_string())
            })?;

        AuthUser::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> ManagementClaims {
        ManagementClaims {
            sub: "user-1".to_string(),
            username: "jdoe".to_string(),
            display_name: Some("John Doe".to_string()),
            org: "DEFAULT".to_string(),
            iss: "am-management".to_string(),
            aud: "am-management-api".to_string(),
            token_type: "management".to_string(),
            iat: 1_000_000,
            exp: 1_003_600,
        }
    }

    #[test]
    fn test_auth_user_from_claims() {
        let user = AuthUser::from_claims(claims()).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.organization_id, "DEFAULT");
        assert_eq!(user.display(), "John Doe");
    }

    #[test]
    fn test_auth_user_display_falls_back_to_username() {
        let mut c = claims();
        c.display_name = None;
        let user = AuthUser::from_claims(c).unwrap();
        assert_eq!(user.display(), "jdoe");
    }

    #[test]
    fn test_auth_user_empty_subject_rejected() {
        let mut c = claims();
        c.sub = "  ".to_string();
        assert!(matches!(
            AuthUser::from_claims(c),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer test-token-123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "test-token-123");
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let headers = axum::http::HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        for error in [
            AuthError::MissingToken,
            AuthError::InvalidHeader("x".to_string()),
            AuthError::InvalidToken("x".to_string()),
        ] {
            assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
