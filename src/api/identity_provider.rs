//! Identity provider API handlers

use crate::api::{check_permission, created, owned_by, require_domain};
use crate::domain::{
    Acl, IdentityProvider, NewIdentityProvider, Permission, UpdateIdentityProvider,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::IdentityProviderService;
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
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct IdentityProviderSearch {
    /// Only keep providers able to manage users
    #[serde(default)]
    pub user_provider: bool,
}

async fn load<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    (organization_id, environment_id, domain_id, identity_id): &(String, String, String, String),
    acl: Acl,
) -> Result<IdentityProvider> {
    let scope = ResourceScope::domain(organization_id, environment_id, domain_id);
    check_permission(state, auth, &scope, Permission::DomainIdentityProvider, acl).await?;

    let domain = require_domain(state, environment_id, domain_id).await?;
    owned_by(
        state
            .identity_provider_service()
            .find_by_id(identity_id)
            .await?,
        |idp| idp.domain.as_str(),
        &domain.id,
        "Identity provider",
        identity_id,
    )
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/identities",
    tag = "Identity providers",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        IdentityProviderSearch,
    ),
    responses(
        (status = 200, description = "Identity providers of the domain", body = [IdentityProvider]),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the identity providers of a domain
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Query(search): Query<IdentityProviderSearch>,
) -> Result<Json<Vec<IdentityProvider>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(
        &state,
        &auth,
        &scope,
        Permission::DomainIdentityProvider,
        Acl::List,
    )
    .await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let service = state.identity_provider_service();
    let mut providers = service.find_by_domain(&domain.id).await?;
    if search.user_provider {
        providers.retain(|idp| service.is_user_provider(&idp.provider_type));
    }
    Ok(Json(providers))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/identities",
    tag = "Identity providers",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewIdentityProvider,
    responses(
        (status = 201, description = "Identity provider created", body = IdentityProvider),
        (status = 403, description = "Permission denied"),
        (status = 409, description = "Identity provider id already used")
    )
)]
/// Create an identity provider
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewIdentityProvider>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(
        &state,
        &auth,
        &scope,
        Permission::DomainIdentityProvider,
        Acl::Create,
    )
    .await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let provider = state
        .identity_provider_service()
        .create(&domain.id, input, &auth)
        .await?;
    Ok(created(&uri, provider.id.clone(), provider))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/identities/{identity}",
    tag = "Identity providers",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("identity" = String, Path, description = "Identity provider id"),
    ),
    responses(
        (status = 200, description = "Identity provider", body = IdentityProvider),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or identity provider not found")
    )
)]
/// Get an identity provider
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
) -> Result<Json<IdentityProvider>> {
    Ok(Json(load(&state, &auth, &path, Acl::Read).await?))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/identities/{identity}",
    tag = "Identity providers",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("identity" = String, Path, description = "Identity provider id"),
    ),
    request_body = UpdateIdentityProvider,
    responses(
        (status = 200, description = "Identity provider updated", body = IdentityProvider),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or identity provider not found")
    )
)]
/// Update an identity provider
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
    Json(input): Json<UpdateIdentityProvider>,
) -> Result<Json<IdentityProvider>> {
    let provider = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .identity_provider_service()
        .update(&provider.domain, &provider.id, input, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/identities/{identity}",
    tag = "Identity providers",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("identity" = String, Path, description = "Identity provider id"),
    ),
    responses(
        (status = 204, description = "Identity provider deleted"),
        (status = 400, description = "System provider or provider in use"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or identity provider not found")
    )
)]
/// Delete an identity provider
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse> {
    let provider = load(&state, &auth, &path, Acl::Delete).await?;
    state
        .identity_provider_service()
        .delete(&provider.domain, &provider.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
