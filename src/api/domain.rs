//! Security domain API handlers

use crate::api::{check_permission, created, require_domain, Page, PageQuery};
use crate::domain::{
    Acl, Domain, Entrypoint, NewDomain, PatchDomain, Permission, ReferenceType,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::permission::{enforce, is_granted, PermissionAcls, ResourceScope};
use crate::service::DomainService;
use crate::state::HasServices;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DomainSearch {
    /// Case-insensitive name filter
    pub q: Option<String>,
}

/// Strip the settings blocks unless the caller may read them
async fn readable<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    scope: &ResourceScope,
    mut domain: Domain,
) -> Result<Domain> {
    let can_read_settings = is_granted(
        state.permission_service(),
        auth,
        &scope.permission(Permission::DomainSettings, &[Acl::Read]),
    )
    .await?;
    if !can_read_settings {
        domain.strip_settings();
    }
    Ok(domain)
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        PageQuery,
        DomainSearch,
    ),
    responses(
        (status = 200, description = "Domains visible to the caller", body = Page<Domain>),
        (status = 401, description = "Missing or invalid token")
    )
)]
/// List the domains of an environment.
///
/// Callers with DOMAIN[LIST] on the environment or organization see every domain;
/// other callers only see the domains they hold DOMAIN[LIST] on.
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id)): Path<(String, String)>,
    Query(page): Query<PageQuery>,
    Query(search): Query<DomainSearch>,
) -> Result<Json<Page<Domain>>> {
    let permissions = state.permission_service();
    let scope = ResourceScope::environment(&organization_id, &environment_id);
    let sees_all = is_granted(
        permissions,
        &auth,
        &scope.permission(Permission::Domain, &[Acl::List]),
    )
    .await?;

    let mut domains = Vec::new();
    for domain in state
        .domain_service()
        .find_all_by_environment(&environment_id)
        .await?
    {
        let visible = sees_all
            || is_granted(
                permissions,
                &auth,
                &PermissionAcls::of(
                    ReferenceType::Domain,
                    &domain.id,
                    Permission::Domain,
                    &[Acl::List],
                ),
            )
            .await?;
        if visible {
            domains.push(domain);
        }
    }

    if let Some(q) = search.q.filter(|q| !q.trim().is_empty()) {
        let q = q.to_lowercase();
        domains.retain(|d| d.name.to_lowercase().contains(&q));
    }
    domains.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    for domain in &mut domains {
        domain.strip_settings();
    }

    Ok(Json(Page::slice(domains, &page)))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
    ),
    request_body = NewDomain,
    responses(
        (status = 201, description = "Domain created", body = Domain),
        (status = 403, description = "Permission denied"),
        (status = 409, description = "A domain with the same hrid exists")
    )
)]
/// Create a security domain
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id)): Path<(String, String)>,
    Json(input): Json<NewDomain>,
) -> Result<Response> {
    let scope = ResourceScope::environment(&organization_id, &environment_id);
    check_permission(&state, &auth, &scope, Permission::Domain, Acl::Create).await?;

    let domain = state
        .domain_service()
        .create(&organization_id, &environment_id, input, &auth)
        .await?;
    Ok(created(&uri, domain.id.clone(), domain))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "Domain", body = Domain),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Get a domain
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<Domain>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::Domain, Acl::Read).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    Ok(Json(readable(&state, &auth, &scope, domain).await?))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/_hrid/{hrid}",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("hrid" = String, Path, description = "Human readable domain id"),
    ),
    responses(
        (status = 200, description = "Domain", body = Domain),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Get a domain by its human readable id
pub async fn get_by_hrid<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, hrid)): Path<(String, String, String)>,
) -> Result<Json<Domain>> {
    // An unknown hrid only reads as 404 to callers allowed to read any domain
    // of the environment; everyone else sees the same 403 as for a real one.
    let Some(domain) = state
        .domain_service()
        .find_by_hrid(&environment_id, &hrid)
        .await?
    else {
        let scope = ResourceScope::environment(&organization_id, &environment_id);
        check_permission(&state, &auth, &scope, Permission::Domain, Acl::Read).await?;
        return Err(AppError::domain_not_found(&hrid));
    };

    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain.id);
    check_permission(&state, &auth, &scope, Permission::Domain, Acl::Read).await?;

    Ok(Json(readable(&state, &auth, &scope, domain).await?))
}

#[utoipa::path(
    patch,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = PatchDomain,
    responses(
        (status = 200, description = "Domain updated", body = Domain),
        (status = 400, description = "Invalid path or virtual hosts"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Patch a domain. Also mounted on PUT.
///
/// The caller needs UPDATE on every permission the patched fields map to.
pub async fn patch<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<PatchDomain>,
) -> Result<Json<Domain>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    let required = scope.update_all(input.required_permissions(), Permission::DomainSettings);
    enforce(state.permission_service(), &auth, &required).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let updated = state
        .domain_service()
        .patch(&domain.id, input, &auth)
        .await?;
    Ok(Json(readable(&state, &auth, &scope, updated).await?))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 204, description = "Domain deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Delete a domain and everything attached to it
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::Domain, Acl::Delete).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    state.domain_service().delete(&domain.id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/entrypoints",
    tag = "Domains",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "Gateway entrypoints", body = [Entrypoint]),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the gateway URLs the domain is reachable on
pub async fn entrypoints<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<Vec<Entrypoint>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::Domain, Acl::Read).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    Ok(Json(build_entrypoints(&state.config().gateway_url, &domain)))
}

/// One entrypoint on the gateway, or one per virtual host in vhost mode
pub(crate) fn build_entrypoints(gateway_url: &str, domain: &Domain) -> Vec<Entrypoint> {
    if !domain.vhost_mode {
        return vec![Entrypoint {
            name: "Default".to_string(),
            description: Some("Default entrypoint".to_string()),
            url: format!("{}{}", gateway_url.trim_end_matches('/'), domain.path),
            tags: vec![],
        }];
    }

    let scheme = url::Url::parse(gateway_url)
        .map(|u| u.scheme().to_string())
        .unwrap_or_else(|_| "https".to_string());
    domain
        .vhosts
        .iter()
        .map(|vhost| Entrypoint {
            name: vhost.host.clone(),
            description: Some(format!("Virtual host {}", vhost.host)),
            url: format!(
                "{}://{}{}",
                scheme,
                vhost.host,
                vhost.path.trim_end_matches('/')
            ),
            tags: if vhost.override_entrypoint {
                vec!["override".to_string()]
            } else {
                vec![]
            },
        })
        .collect()
}
