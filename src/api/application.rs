//! Application API handlers

use crate::api::{check_permission, created, require_application, require_domain, Page, PageQuery};
use crate::domain::{
    Acl, Application, NewApplication, PatchApplication, Permission, ReferenceType,
    UpdateApplicationType,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::{enforce, is_granted, PermissionAcls, ResourceScope};
use crate::service::ApplicationService;
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
pub struct ApplicationSearch {
    /// Case-insensitive match on the name or the client id
    pub q: Option<String>,
}

fn matches_query(application: &Application, q: &str) -> bool {
    application.name.to_lowercase().contains(q)
        || application
            .client_id()
            .is_some_and(|client_id| client_id.to_lowercase().contains(q))
}

/// Strip what the caller is not allowed to read
async fn readable<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    scope: &ResourceScope,
    mut application: Application,
) -> Result<Application> {
    let permissions = state.permission_service();
    let settings = is_granted(
        permissions,
        auth,
        &scope.permission(Permission::ApplicationSettings, &[Acl::Read]),
    )
    .await?;
    if !settings {
        application.strip_settings();
        return Ok(application);
    }

    let openid = is_granted(
        permissions,
        auth,
        &scope.permission(Permission::ApplicationOpenid, &[Acl::Read]),
    )
    .await?;
    if !openid {
        application.strip_client_secret();
    }
    Ok(application)
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        PageQuery,
        ApplicationSearch,
    ),
    responses(
        (status = 200, description = "Applications visible to the caller", body = Page<Application>),
        (status = 404, description = "Domain not found")
    )
)]
/// List the applications of a domain.
///
/// Settings are never part of the listing.
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Query(page): Query<PageQuery>,
    Query(search): Query<ApplicationSearch>,
) -> Result<Json<Page<Application>>> {
    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let permissions = state.permission_service();
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain.id);
    let sees_all = is_granted(
        permissions,
        &auth,
        &scope.permission(Permission::Application, &[Acl::List]),
    )
    .await?;

    let q = search
        .q
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    let mut applications = Vec::new();
    for mut application in state.application_service().find_by_domain(&domain.id).await? {
        if let Some(q) = &q {
            if !matches_query(&application, q) {
                continue;
            }
        }
        let visible = sees_all
            || is_granted(
                permissions,
                &auth,
                &PermissionAcls::of(
                    ReferenceType::Application,
                    &application.id,
                    Permission::Application,
                    &[Acl::List],
                ),
            )
            .await?;
        if visible {
            application.strip_settings();
            applications.push(application);
        }
    }
    applications.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Json(Page::slice(applications, &page)))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewApplication,
    responses(
        (status = 201, description = "Application created", body = Application),
        (status = 400, description = "Invalid redirect URI"),
        (status = 403, description = "Permission denied"),
        (status = 409, description = "Client id already used in the domain")
    )
)]
/// Create an application
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewApplication>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::Application, Acl::Create).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let application = state
        .application_service()
        .create(&domain.id, input, &auth)
        .await?;
    Ok(created(&uri, application.id.clone(), application))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    responses(
        (status = 200, description = "Application", body = Application),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// Get an application
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<Application>> {
    let scope =
        ResourceScope::application(&organization_id, &environment_id, &domain_id, &application_id);
    check_permission(&state, &auth, &scope, Permission::Application, Acl::Read).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let application = require_application(&state, &domain.id, &application_id).await?;
    Ok(Json(readable(&state, &auth, &scope, application).await?))
}

#[utoipa::path(
    patch,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    request_body = PatchApplication,
    responses(
        (status = 200, description = "Application updated", body = Application),
        (status = 400, description = "Invalid redirect URI or unknown reference"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// Patch an application. Also mounted on PUT.
pub async fn patch<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
    Json(input): Json<PatchApplication>,
) -> Result<Json<Application>> {
    let scope =
        ResourceScope::application(&organization_id, &environment_id, &domain_id, &application_id);
    let required =
        scope.update_all(input.required_permissions(), Permission::ApplicationSettings);
    enforce(state.permission_service(), &auth, &required).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let application = require_application(&state, &domain.id, &application_id).await?;
    let updated = state
        .application_service()
        .patch(&domain.id, &application.id, input, &auth)
        .await?;
    Ok(Json(readable(&state, &auth, &scope, updated).await?))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}/type",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    request_body = UpdateApplicationType,
    responses(
        (status = 200, description = "Application type changed", body = Application),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// Change the application type
pub async fn update_type<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
    Json(input): Json<UpdateApplicationType>,
) -> Result<Json<Application>> {
    let scope =
        ResourceScope::application(&organization_id, &environment_id, &domain_id, &application_id);
    check_permission(&state, &auth, &scope, Permission::Application, Acl::Update).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let application = require_application(&state, &domain.id, &application_id).await?;
    let updated = state
        .application_service()
        .update_type(&domain.id, &application.id, input.app_type, &auth)
        .await?;
    Ok(Json(readable(&state, &auth, &scope, updated).await?))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    responses(
        (status = 204, description = "Application deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// Delete an application
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<impl IntoResponse> {
    let scope =
        ResourceScope::application(&organization_id, &environment_id, &domain_id, &application_id);
    check_permission(&state, &auth, &scope, Permission::Application, Acl::Delete).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let application = require_application(&state, &domain.id, &application_id).await?;
    state
        .application_service()
        .delete(&application.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}/secret/_renew",
    tag = "Applications",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    responses(
        (status = 200, description = "Client secret renewed", body = Application),
        (status = 400, description = "Public clients have no secret"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// Generate a new client secret
pub async fn renew_secret<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<Application>> {
    let scope =
        ResourceScope::application(&organization_id, &environment_id, &domain_id, &application_id);
    check_permission(&state, &auth, &scope, Permission::ApplicationOpenid, Acl::Update).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let application = require_application(&state, &domain.id, &application_id).await?;
    let renewed = state
        .application_service()
        .renew_client_secret(&domain.id, &application.id, &auth)
        .await?;

    // The caller always gets back the secret it just generated
    let mut response = readable(&state, &auth, &scope, renewed.clone()).await?;
    response.restore_oauth(&renewed);
    Ok(Json(response))
}
