//! Domain user API handlers

use crate::api::{check_permission, created, owned_by, require_domain, Page, PageQuery};
use crate::domain::{
    Acl, NewUser, PasswordValue, Permission, StatusEntity, UpdateUser, User, UsernameEntity,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::UserService;
use crate::state::HasServices;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

type UserPath = (String, String, String, String);

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearch {
    /// Matches username, email or display name
    pub q: Option<String>,
}

/// Check DOMAIN_USER[acl] and load a user of the domain
async fn load<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    (organization_id, environment_id, domain_id, user_id): &UserPath,
    acl: Acl,
) -> Result<User> {
    let scope = ResourceScope::domain(organization_id, environment_id, domain_id);
    check_permission(state, auth, &scope, Permission::DomainUser, acl).await?;

    let domain = require_domain(state, environment_id, domain_id).await?;
    owned_by(
        state.user_service().find_by_id(user_id).await?,
        |u| u.domain.as_str(),
        &domain.id,
        "User",
        user_id,
    )
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        PageQuery,
        UserSearch,
    ),
    responses(
        (status = 200, description = "Users of the domain", body = Page<User>),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List or search the users of a domain
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Query(page): Query<PageQuery>,
    Query(search): Query<UserSearch>,
) -> Result<Json<Page<User>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainUser, Acl::List).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let query = search.q.filter(|q| !q.trim().is_empty());
    let (users, total) = state
        .user_service()
        .search(&domain.id, query, page.page, page.size)
        .await?;
    Ok(Json(Page::new(users, page.page, total)))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Password rejected or unknown source"),
        (status = 403, description = "Permission denied"),
        (status = 409, description = "Username already exists")
    )
)]
/// Create a user
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewUser>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainUser, Acl::Create).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let user = state.user_service().create(&domain.id, input, &auth).await?;
    Ok(created(&uri, user.id.clone(), user))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Get a user
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
) -> Result<Json<User>> {
    Ok(Json(load(&state, &auth, &path, Acl::Read).await?))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Update a user's profile
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>> {
    let user = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .user_service()
        .update(&user.domain, &user.id, input, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Delete a user
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
) -> Result<impl IntoResponse> {
    let user = load(&state, &auth, &path, Acl::Delete).await?;
    state
        .user_service()
        .delete(&user.domain, &user.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}/status",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    request_body = StatusEntity,
    responses(
        (status = 200, description = "User status changed", body = User),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Enable or disable a user
pub async fn update_status<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
    Json(input): Json<StatusEntity>,
) -> Result<Json<User>> {
    let user = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .user_service()
        .update_status(&user.domain, &user.id, input.enabled, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}/resetPassword",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    request_body = PasswordValue,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Password rejected by the password policy"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Reset a user's password
pub async fn reset_password<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
    Json(input): Json<PasswordValue>,
) -> Result<impl IntoResponse> {
    let user = load(&state, &auth, &path, Acl::Update).await?;
    input.validate()?;
    state
        .user_service()
        .reset_password(&user.domain, &user.id, input.password, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}/lock",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "User locked", body = User),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Lock a user account
pub async fn lock<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
) -> Result<Json<User>> {
    let user = load(&state, &auth, &path, Acl::Update).await?;
    let locked = state
        .user_service()
        .lock(&user.domain, &user.id, &auth)
        .await?;
    Ok(Json(locked))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}/unlock",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "User unlocked", body = User),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found")
    )
)]
/// Unlock a user account
pub async fn unlock<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
) -> Result<Json<User>> {
    let user = load(&state, &auth, &path, Acl::Update).await?;
    let unlocked = state
        .user_service()
        .unlock(&user.domain, &user.id, &auth)
        .await?;
    Ok(Json(unlocked))
}

#[utoipa::path(
    patch,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/users/{user}/username",
    tag = "Users",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("user" = String, Path, description = "User id"),
    ),
    request_body = UsernameEntity,
    responses(
        (status = 200, description = "Username changed", body = User),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or user not found"),
        (status = 409, description = "Username already exists")
    )
)]
/// Rename a user
pub async fn update_username<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<UserPath>,
    Json(input): Json<UsernameEntity>,
) -> Result<Json<User>> {
    let user = load(&state, &auth, &path, Acl::Update).await?;
    input.validate()?;
    let updated = state
        .user_service()
        .update_username(&user.domain, &user.id, input.username, &auth)
        .await?;
    Ok(Json(updated))
}
