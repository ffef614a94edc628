//! Authorization engine API handlers

use crate::api::{check_permission, created, owned_by, require_domain};
use crate::domain::{
    Acl, AuthorizationEngine, NewAuthorizationEngine, Permission, UpdateAuthorizationEngine,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::AuthorizationEngineService;
use crate::state::HasServices;
use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

type EnginePath = (String, String, String, String);

async fn load<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    (organization_id, environment_id, domain_id, engine_id): &EnginePath,
    acl: Acl,
) -> Result<AuthorizationEngine> {
    let scope = ResourceScope::domain(organization_id, environment_id, domain_id);
    check_permission(state, auth, &scope, Permission::DomainAuthorizationEngine, acl).await?;

    let domain = require_domain(state, environment_id, domain_id).await?;
    owned_by(
        state
            .authorization_engine_service()
            .find_by_id(engine_id)
            .await?,
        |e| e.domain.as_str(),
        &domain.id,
        "Authorization engine",
        engine_id,
    )
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/authorization-engines",
    tag = "Authorization engines",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "Authorization engines of the domain", body = [AuthorizationEngine]),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the authorization engines of a domain
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<Vec<AuthorizationEngine>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(
        &state,
        &auth,
        &scope,
        Permission::DomainAuthorizationEngine,
        Acl::List,
    )
    .await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let engines = state
        .authorization_engine_service()
        .find_by_domain(&domain.id)
        .await?;
    Ok(Json(engines))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/authorization-engines",
    tag = "Authorization engines",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewAuthorizationEngine,
    responses(
        (status = 201, description = "Authorization engine created", body = AuthorizationEngine),
        (status = 400, description = "An engine of this type already exists"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Create an authorization engine
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewAuthorizationEngine>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(
        &state,
        &auth,
        &scope,
        Permission::DomainAuthorizationEngine,
        Acl::Create,
    )
    .await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let engine = state
        .authorization_engine_service()
        .create(&domain.id, input, &auth)
        .await?;
    Ok(created(&uri, engine.id.clone(), engine))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/authorization-engines/{engine}",
    tag = "Authorization engines",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("engine" = String, Path, description = "Authorization engine id"),
    ),
    responses(
        (status = 200, description = "Authorization engine", body = AuthorizationEngine),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or authorization engine not found")
    )
)]
/// Get an authorization engine
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<EnginePath>,
) -> Result<Json<AuthorizationEngine>> {
    Ok(Json(load(&state, &auth, &path, Acl::Read).await?))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/authorization-engines/{engine}",
    tag = "Authorization engines",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("engine" = String, Path, description = "Authorization engine id"),
    ),
    request_body = UpdateAuthorizationEngine,
    responses(
        (status = 200, description = "Authorization engine updated", body = AuthorizationEngine),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or authorization engine not found")
    )
)]
/// Update an authorization engine
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<EnginePath>,
    Json(input): Json<UpdateAuthorizationEngine>,
) -> Result<Json<AuthorizationEngine>> {
    let engine = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .authorization_engine_service()
        .update(&engine.domain, &engine.id, input, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/authorization-engines/{engine}",
    tag = "Authorization engines",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("engine" = String, Path, description = "Authorization engine id"),
    ),
    responses(
        (status = 204, description = "Authorization engine deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or authorization engine not found")
    )
)]
/// Delete an authorization engine
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<EnginePath>,
) -> Result<impl IntoResponse> {
    let engine = load(&state, &auth, &path, Acl::Delete).await?;
    state
        .authorization_engine_service()
        .delete(&engine.domain, &engine.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
