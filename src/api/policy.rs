//! Extension point policy API handlers

use crate::api::{check_permission, created, owned_by, require_domain};
use crate::domain::{Acl, ExtensionPoint, NewPolicy, Permission, Policy, PolicyReorder, UpdatePolicy};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::PolicyService;
use crate::state::HasServices;
use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeMap;

type PolicyPath = (String, String, String, String);

/// Group policies by extension point, keeping the service's order within a group
pub(crate) fn group_by_extension_point(
    policies: Vec<Policy>,
) -> BTreeMap<ExtensionPoint, Vec<Policy>> {
    let mut grouped: BTreeMap<ExtensionPoint, Vec<Policy>> = BTreeMap::new();
    for policy in policies {
        grouped
            .entry(policy.extension_point)
            .or_default()
            .push(policy);
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|p| p.order);
    }
    grouped
}

async fn load<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    (organization_id, environment_id, domain_id, policy_id): &PolicyPath,
    acl: Acl,
) -> Result<Policy> {
    let scope = ResourceScope::domain(organization_id, environment_id, domain_id);
    check_permission(state, auth, &scope, Permission::DomainExtensionPoint, acl).await?;

    let domain = require_domain(state, environment_id, domain_id).await?;
    owned_by(
        state.policy_service().find_by_id(policy_id).await?,
        |p| p.domain.as_str(),
        &domain.id,
        "Policy",
        policy_id,
    )
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/policies",
    tag = "Policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "Policies grouped by extension point", body = BTreeMap<String, Vec<Policy>>),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the policies of a domain, grouped by extension point
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<BTreeMap<ExtensionPoint, Vec<Policy>>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainExtensionPoint, Acl::List).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let policies = state.policy_service().find_by_domain(&domain.id).await?;
    Ok(Json(group_by_extension_point(policies)))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/policies",
    tag = "Policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewPolicy,
    responses(
        (status = 201, description = "Policy created", body = Policy),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Create a policy
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewPolicy>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainExtensionPoint, Acl::Create).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let policy = state.policy_service().create(&domain.id, input, &auth).await?;
    Ok(created(&uri, policy.id.clone(), policy))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/policies",
    tag = "Policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = Vec<PolicyReorder>,
    responses(
        (status = 200, description = "Policies updated", body = [Policy]),
        (status = 400, description = "A policy does not belong to the domain"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Update several policies at once, typically to reorder them
pub async fn update_all<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(entries): Json<Vec<PolicyReorder>>,
) -> Result<Json<Vec<Policy>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainExtensionPoint, Acl::Update).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let policies = state
        .policy_service()
        .update_all(&domain.id, entries, &auth)
        .await?;
    Ok(Json(policies))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/policies/{policy}",
    tag = "Policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Policy id"),
    ),
    responses(
        (status = 200, description = "Policy", body = Policy),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or policy not found")
    )
)]
/// Get a policy
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
) -> Result<Json<Policy>> {
    Ok(Json(load(&state, &auth, &path, Acl::Read).await?))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/policies/{policy}",
    tag = "Policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Policy id"),
    ),
    request_body = UpdatePolicy,
    responses(
        (status = 200, description = "Policy updated", body = Policy),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or policy not found")
    )
)]
/// Update a policy
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
    Json(input): Json<UpdatePolicy>,
) -> Result<Json<Policy>> {
    let policy = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .policy_service()
        .update(&policy.domain, &policy.id, input, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/policies/{policy}",
    tag = "Policies",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("policy" = String, Path, description = "Policy id"),
    ),
    responses(
        (status = 204, description = "Policy deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or policy not found")
    )
)]
/// Delete a policy
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<PolicyPath>,
) -> Result<impl IntoResponse> {
    let policy = load(&state, &auth, &path, Acl::Delete).await?;
    state
        .policy_service()
        .delete(&policy.domain, &policy.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn policy(name: &str, extension_point: ExtensionPoint, order: i32) -> Policy {
        let now = Utc::now();
        Policy {
            id: name.to_string(),
            name: name.to_string(),
            policy_type: "groovy".to_string(),
            extension_point,
            enabled: true,
            order,
            configuration: serde_json::json!({}),
            domain: "dom-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_group_by_extension_point() {
        let grouped = group_by_extension_point(vec![
            policy("b", ExtensionPoint::PreLogin, 2),
            policy("a", ExtensionPoint::PreLogin, 1),
            policy("c", ExtensionPoint::PostConsent, 0),
        ]);
        let pre_login: Vec<_> = grouped[&ExtensionPoint::PreLogin]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(pre_login, vec!["a", "b"]);
        assert_eq!(grouped[&ExtensionPoint::PostConsent].len(), 1);

        let json = serde_json::to_value(&grouped).unwrap();
        assert!(json.get("PRE_LOGIN").is_some());
        assert!(json.get("POST_CONSENT").is_some());
    }
}
