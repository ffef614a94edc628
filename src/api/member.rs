//! Domain and application membership API handlers

use crate::api::{check_permission, created, require_application, require_domain};
use crate::domain::{
    Acl, Membership, MembershipListItem, NewMembership, Permission, PermissionMap, ReferenceType,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::permission::{merged_permissions, ResourceScope};
use crate::service::MembershipService;
use crate::state::HasServices;
use axum::{
    extract::{OriginalUri, Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::{BTreeMap, BTreeSet};

/// Merged permissions as returned to clients: `{PERMISSION: [ACL...]}`
pub type PermissionsResponse = BTreeMap<Permission, BTreeSet<Acl>>;

pub(crate) fn to_response(permissions: PermissionMap) -> PermissionsResponse {
    permissions
        .into_iter()
        .filter(|(_, acls)| !acls.is_empty())
        .map(|(permission, acls)| (permission, acls.into_iter().collect()))
        .collect()
}

/// The resource a membership request targets, resolved from the path
struct MemberTarget {
    scope: ResourceScope,
    reference_type: ReferenceType,
    reference_id: String,
    permission: Permission,
}

impl MemberTarget {
    fn domain(organization_id: &str, environment_id: &str, domain_id: &str) -> Self {
        Self {
            scope: ResourceScope::domain(organization_id, environment_id, domain_id),
            reference_type: ReferenceType::Domain,
            reference_id: domain_id.to_string(),
            permission: Permission::DomainMember,
        }
    }

    fn application(
        organization_id: &str,
        environment_id: &str,
        domain_id: &str,
        application_id: &str,
    ) -> Self {
        Self {
            scope: ResourceScope::application(
                organization_id,
                environment_id,
                domain_id,
                application_id,
            ),
            reference_type: ReferenceType::Application,
            reference_id: application_id.to_string(),
            permission: Permission::ApplicationMember,
        }
    }

    /// Check the member permission, then make sure the path resources exist
    async fn authorize<S: HasServices>(&self, state: &S, auth: &AuthUser, acl: Acl) -> Result<()> {
        check_permission(state, auth, &self.scope, self.permission, acl).await?;
        self.resolve(state).await
    }

    async fn resolve<S: HasServices>(&self, state: &S) -> Result<()> {
        let domain_id = self.scope.domain_id.as_deref().unwrap_or_default();
        let domain = require_domain(state, &self.scope.environment_id, domain_id).await?;
        if let Some(application_id) = &self.scope.application_id {
            require_application(state, &domain.id, application_id).await?;
        }
        Ok(())
    }

    async fn list<S: HasServices>(&self, state: &S, auth: &AuthUser) -> Result<MembershipListItem> {
        self.authorize(state, auth, Acl::List).await?;
        state
            .membership_service()
            .find_by_reference(self.reference_type, &self.reference_id)
            .await
    }

    async fn add<S: HasServices>(
        &self,
        state: &S,
        auth: &AuthUser,
        uri: &Uri,
        input: NewMembership,
    ) -> Result<Response> {
        self.authorize(state, auth, Acl::Create).await?;
        let membership = state
            .membership_service()
            .add_or_update_member(
                &self.scope.organization_id,
                self.reference_type,
                &self.reference_id,
                input,
                auth,
            )
            .await?;
        Ok(created(uri, membership.id.clone(), membership))
    }

    async fn remove<S: HasServices>(
        &self,
        state: &S,
        auth: &AuthUser,
        membership_id: &str,
    ) -> Result<()> {
        self.authorize(state, auth, Acl::Delete).await?;
        let service = state.membership_service();
        let membership = service
            .find_by_id(membership_id)
            .await?
            .filter(|m| m.is_on(self.reference_type, &self.reference_id))
            .ok_or_else(|| {
                AppError::NotFound(format!("Membership [{}] can not be found.", membership_id))
            })?;
        service.delete(&membership.id, auth).await
    }

    async fn permissions<S: HasServices>(
        &self,
        state: &S,
        auth: &AuthUser,
    ) -> Result<PermissionsResponse> {
        self.resolve(state).await?;
        let merged = merged_permissions(state.permission_service(), auth, &self.scope).await?;
        Ok(to_response(merged))
    }
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/members",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "Members of the domain", body = MembershipListItem),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the members of a domain
pub async fn list_domain<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<MembershipListItem>> {
    let target = MemberTarget::domain(&organization_id, &environment_id, &domain_id);
    Ok(Json(target.list(&state, &auth).await?))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/members",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewMembership,
    responses(
        (status = 201, description = "Member added or role changed", body = Membership),
        (status = 400, description = "Role not assignable"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Add a member to a domain, or change its role
pub async fn add_domain<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewMembership>,
) -> Result<Response> {
    let target = MemberTarget::domain(&organization_id, &environment_id, &domain_id);
    target.add(&state, &auth, &uri, input).await
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/members/{member}",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("member" = String, Path, description = "Membership id"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "The primary owner cannot be removed"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or membership not found")
    )
)]
/// Remove a member from a domain
pub async fn remove_domain<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, membership_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<impl IntoResponse> {
    let target = MemberTarget::domain(&organization_id, &environment_id, &domain_id);
    target.remove(&state, &auth, &membership_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/members/permissions",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 200, description = "The caller's permissions on the domain", body = BTreeMap<String, Vec<Acl>>),
        (status = 404, description = "Domain not found")
    )
)]
/// The caller's permissions on a domain, merged with those inherited from above
pub async fn domain_permissions<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<Json<PermissionsResponse>> {
    let target = MemberTarget::domain(&organization_id, &environment_id, &domain_id);
    Ok(Json(target.permissions(&state, &auth).await?))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}/members",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    responses(
        (status = 200, description = "Members of the application", body = MembershipListItem),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// List the members of an application
pub async fn list_application<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<MembershipListItem>> {
    let target = MemberTarget::application(
        &organization_id,
        &environment_id,
        &domain_id,
        &application_id,
    );
    Ok(Json(target.list(&state, &auth).await?))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}/members",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    request_body = NewMembership,
    responses(
        (status = 201, description = "Member added or role changed", body = Membership),
        (status = 400, description = "Role not assignable"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or application not found")
    )
)]
/// Add a member to an application, or change its role
pub async fn add_application<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
    Json(input): Json<NewMembership>,
) -> Result<Response> {
    let target = MemberTarget::application(
        &organization_id,
        &environment_id,
        &domain_id,
        &application_id,
    );
    target.add(&state, &auth, &uri, input).await
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}/members/{member}",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
        ("member" = String, Path, description = "Membership id"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "The primary owner cannot be removed"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain, application or membership not found")
    )
)]
/// Remove a member from an application
pub async fn remove_application<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id, membership_id)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Result<impl IntoResponse> {
    let target = MemberTarget::application(
        &organization_id,
        &environment_id,
        &domain_id,
        &application_id,
    );
    target.remove(&state, &auth, &membership_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/applications/{application}/members/permissions",
    tag = "Members",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("application" = String, Path, description = "Application id"),
    ),
    responses(
        (status = 200, description = "The caller's permissions on the application", body = BTreeMap<String, Vec<Acl>>),
        (status = 404, description = "Domain or application not found")
    )
)]
/// The caller's permissions on an application, merged with those inherited from above
pub async fn application_permissions<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, application_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<PermissionsResponse>> {
    let target = MemberTarget::application(
        &organization_id,
        &environment_id,
        &domain_id,
        &application_id,
    );
    Ok(Json(target.permissions(&state, &auth).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_permissions_response_is_sorted() {
        let mut map = PermissionMap::new();
        map.insert(
            Permission::DomainUser,
            [Acl::Update, Acl::Read].into_iter().collect(),
        );
        map.insert(Permission::Domain, [Acl::Read].into_iter().collect());
        map.insert(Permission::DomainAudit, HashSet::new());

        let json = serde_json::to_value(to_response(map)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "DOMAIN": ["READ"],
                "DOMAIN_USER": ["READ", "UPDATE"]
            })
        );
    }
}
