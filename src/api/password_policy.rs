//! Password policy API handlers

use crate::api::{check_permission, created, owned_by, require_domain};
use crate::domain::{Acl, NewPasswordPolicy, PasswordPolicy, Permission, UpdatePasswordPolicy};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::PasswordPolicyService;
use crate::state::HasServices;
use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

type PolicyPath = (String, String, String, String);

/// Password policies are guarded by DOMAIN_SETTINGS
async fn load<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    (organization_id, environment_id, domain_id, policy_id): &PolicyPath,
    acl: Acl,
) -> Result<PasswordPolicy> {
    let scope = ResourceScope::domain(organization_id, environment_id, domain_id);
    check_permission(state, auth, &scope, Permission::DomainSettings, acl).await?;

    let domain = require_domain(state, environment_id, domain_id).await?;
    owned_by(
        state.password_policy_service().find_by_id(policy_id).await?,
        |p| p.domain.as_str(),
        &domain.id,
        "Password policy",
        policy_id,
    )
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/password-policies",
    tag = "Password policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "Password policies of the domain", body = [PasswordPolicy]),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the password policies of a domain
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<Vec<PasswordPolicy>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainSettings, Acl::List).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let policies = state
        .password_policy_service()
        .find_by_domain(&domain.id)
        .await?;
    Ok(Json(policies))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/password-policies",
    tag = "Password policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewPasswordPolicy,
    responses(
        (status = 201, description = "Password policy created", body = PasswordPolicy),
        (status = 400, description = "Inconsistent length rules"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Create a password policy
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewPasswordPolicy>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainSettings, Acl::Create).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let policy = state
        .password_policy_service()
        .create(&domain.id, input, &auth)
        .await?;
    Ok(created(&uri, policy.id.clone(), policy))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/password-policies/{policy}",
    tag = "Password policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Password policy id"),
    ),
    responses(
        (status = 200, description = "Password policy", body = PasswordPolicy),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or password policy not found")
    )
)]
/// Get a password policy
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
) -> Result<Json<PasswordPolicy>> {
    Ok(Json(load(&state, &auth, &path, Acl::Read).await?))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/password-policies/{policy}",
    tag = "Password policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Password policy id"),
    ),
    request_body = NewPasswordPolicy,
    responses(
        (status = 200, description = "Password policy updated", body = PasswordPolicy),
        (status = 400, description = "Inconsistent length rules"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or password policy not found")
    )
)]
/// Update a password policy
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
    Json(input): Json<UpdatePasswordPolicy>,
) -> Result<Json<PasswordPolicy>> {
    let policy = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .password_policy_service()
        .update(&policy.domain, &policy.id, input, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/password-policies/{policy}",
    tag = "Password policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Password policy id"),
    ),
    responses(
        (status = 204, description = "Password policy deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or password policy not found")
    )
)]
/// Delete a password policy
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
) -> Result<impl IntoResponse> {
    let policy = load(&state, &auth, &path, Acl::Delete).await?;
    state
        .password_policy_service()
        .delete(&policy.domain, &policy.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/password-policies/{policy}/default",
    tag = "Password policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Password policy id"),
    ),
    responses(
        (status = 200, description = "Policy is now the domain default", body = PasswordPolicy),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or password policy not found")
    )
)]
/// Make a password policy the default of its domain
pub async fn set_default<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
) -> Result<Json<PasswordPolicy>> {
    let policy = load(&state, &auth, &path, Acl::Update).await?;
    let policy = state
        .password_policy_service()
        .set_default(&policy.domain, &policy.id, &auth)
        .await?;
    Ok(Json(policy))
}
