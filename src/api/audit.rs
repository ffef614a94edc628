//! Audit trail API handlers

use crate::api::{check_permission, require_domain, Page, PageQuery};
use crate::domain::{Acl, Audit, AuditQuery, Permission, ReferenceType};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::AuditService;
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/audits",
    tag = "Audits",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        PageQuery,
        AuditQuery,
    ),
    responses(
        (status = 200, description = "Audit records, newest first", body = Page<Audit>),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the audit records of a domain
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Query(page): Query<PageQuery>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Page<Audit>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainAudit, Acl::List).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let (audits, total) = state
        .audit_service()
        .search(ReferenceType::Domain, &domain.id, query, page.page, page.size)
        .await?;
    Ok(Json(Page::new(audits, page.page, total)))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/audits/{audit}",
    tag = "Audits",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("audit" = String, Path, description = "Audit record id"),
    ),
    responses(
        (status = 200, description = "Audit record", body = Audit),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or audit record not found")
    )
)]
/// Get one audit record
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id, audit_id)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<Audit>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainAudit, Acl::Read).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let audit = state
        .audit_service()
        .find_by_id(&audit_id)
        .await?
        .filter(|a| a.reference_type == ReferenceType::Domain && a.reference_id == domain.id)
        .ok_or_else(|| AppError::NotFound(format!("Audit [{}] can not be found.", audit_id)))?;
    Ok(Json(audit))
}
