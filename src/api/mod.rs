//! REST API shared utilities (pagination, created responses, ownership checks)

pub mod application;
pub mod audit;
pub mod authorization_engine;
pub mod certificate;
pub mod domain;
pub mod health;
pub mod identity_provider;
pub mod member;
pub mod metrics;
pub mod password_policy;
pub mod policy;
pub mod user;

use crate::domain::{Acl, Application, Domain, Permission};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::permission::{enforce, ResourceScope};
use crate::service::{ApplicationService, DomainService};
use crate::state::HasServices;
use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Maximum allowed page size
pub(crate) const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters (0-based page)
#[derive(Debug, Clone, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 0
    #[serde(default, deserialize_with = "deserialize_page")]
    pub page: u32,
    /// Page size, clamped to 100
    #[serde(default = "default_size", deserialize_with = "deserialize_size")]
    pub size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_size(),
        }
    }
}

pub(crate) fn default_size() -> u32 {
    50
}

/// Reject negative page values
pub(crate) fn deserialize_page<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    u32::try_from(value)
        .map_err(|_| serde::de::Error::custom("page must be a non-negative integer (>= 0)"))
}

/// Reject size values less than 1, clamp to MAX_PAGE_SIZE
pub(crate) fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "size must be a positive integer (>= 1)",
        ));
    }
    Ok(value.min(MAX_PAGE_SIZE as i64) as u32)
}

/// One page of a list result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, current_page: u32, total_count: u64) -> Self {
        Self {
            data,
            current_page,
            total_count,
        }
    }

    /// Slice an already filtered and sorted list
    pub fn slice(items: Vec<T>, query: &PageQuery) -> Self {
        let total_count = items.len() as u64;
        let start = (query.page as usize).saturating_mul(query.size as usize);
        let data = items
            .into_iter()
            .skip(start)
            .take(query.size as usize)
            .collect();
        Self::new(data, query.page, total_count)
    }
}

/// `201 Created` with a Location header pointing at the new resource
pub(crate) fn created<T: Serialize>(uri: &Uri, id: String, body: T) -> Response {
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), id);
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(body)).into_response()
}

/// Fail with 403 unless the caller holds `permission[acl]` on the scope or above it
pub(crate) async fn check_permission<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    scope: &ResourceScope,
    permission: Permission,
    acl: Acl,
) -> Result<()> {
    enforce(
        state.permission_service(),
        auth,
        &scope.permission(permission, &[acl]),
    )
    .await
}

/// Load a domain and make sure it lives in the path environment
pub(crate) async fn require_domain<S: HasServices>(
    state: &S,
    environment_id: &str,
    domain_id: &str,
) -> Result<Domain> {
    state
        .domain_service()
        .find_by_id(domain_id)
        .await?
        .filter(|d| d.belongs_to_environment(environment_id))
        .ok_or_else(|| AppError::domain_not_found(domain_id))
}

/// Load an application and make sure it belongs to the path domain
pub(crate) async fn require_application<S: HasServices>(
    state: &S,
    domain_id: &str,
    application_id: &str,
) -> Result<Application> {
    state
        .application_service()
        .find_by_id(application_id)
        .await?
        .filter(|a| a.domain == domain_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Application [{}] can not be found.",
                application_id
            ))
        })
}

/// Resolve an optional sub-resource owned by the path domain, with its own not-found message
pub(crate) fn owned_by<T>(
    found: Option<T>,
    owner: impl Fn(&T) -> &str,
    domain_id: &str,
    kind: &str,
    id: &str,
) -> Result<T> {
    found
        .filter(|item| owner(item) == domain_id)
        .ok_or_else(|| AppError::NotFound(format!("{} [{}] can not be found.", kind, id)))
}
