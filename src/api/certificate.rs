//! Certificate API handlers

use crate::api::{check_permission, created, owned_by, require_domain};
use crate::domain::{Acl, Certificate, CertificateKey, NewCertificate, Permission, UpdateCertificate};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::permission::ResourceScope;
use crate::service::CertificateService;
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
pub struct CertificateSearch {
    /// Key usage filter (`sig` or `enc`)
    #[serde(rename = "use")]
    pub usage: Option<String>,
}

/// Load a certificate of the domain after checking `acl` on DOMAIN_CERTIFICATE
async fn load<S: HasServices>(
    state: &S,
    auth: &AuthUser,
    (organization_id, environment_id, domain_id, certificate_id): &(String, String, String, String),
    acl: Acl,
) -> Result<Certificate> {
    let scope = ResourceScope::domain(organization_id, environment_id, domain_id);
    check_permission(state, auth, &scope, Permission::DomainCertificate, acl).await?;

    let domain = require_domain(state, environment_id, domain_id).await?;
    owned_by(
        state.certificate_service().find_by_id(certificate_id).await?,
        |c| c.domain.as_str(),
        &domain.id,
        "Certificate",
        certificate_id,
    )
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        CertificateSearch,
    ),
    responses(
        (status = 200, description = "Certificates of the domain", body = [Certificate]),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// List the certificates of a domain
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Query(search): Query<CertificateSearch>,
) -> Result<Json<Vec<Certificate>>> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainCertificate, Acl::List).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let mut certificates = state.certificate_service().find_by_domain(&domain.id).await?;
    if let Some(usage) = search.usage.as_deref().filter(|u| !u.is_empty()) {
        certificates.retain(|c| c.has_usage(usage));
    }
    certificates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(certificates))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    request_body = NewCertificate,
    responses(
        (status = 201, description = "Certificate created", body = Certificate),
        (status = 400, description = "Invalid configuration"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Create a certificate
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    OriginalUri(uri): OriginalUri,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
    Json(input): Json<NewCertificate>,
) -> Result<Response> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainCertificate, Acl::Create).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let certificate = state
        .certificate_service()
        .create(&domain.id, input, &auth)
        .await?;
    Ok(created(&uri, certificate.id.clone(), certificate))
}

#[utoipa::path(
    post,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates/rotate",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
    ),
    responses(
        (status = 201, description = "New system certificate", body = Certificate),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain not found")
    )
)]
/// Rotate the domain's system certificate
pub async fn rotate<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path((organization_id, environment_id, domain_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse> {
    let scope = ResourceScope::domain(&organization_id, &environment_id, &domain_id);
    check_permission(&state, &auth, &scope, Permission::DomainCertificate, Acl::Create).await?;

    let domain = require_domain(&state, &environment_id, &domain_id).await?;
    let certificate = state.certificate_service().rotate(&domain.id, &auth).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates/{certificate}",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("certificate" = String, Path, description = "Certificate id"),
    ),
    responses(
        (status = 200, description = "Certificate", body = Certificate),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or certificate not found")
    )
)]
/// Get a certificate
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
) -> Result<Json<Certificate>> {
    Ok(Json(load(&state, &auth, &path, Acl::Read).await?))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates/{certificate}/key",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("certificate" = String, Path, description = "Certificate id"),
    ),
    responses(
        (status = 200, description = "Public key", body = String),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or certificate not found")
    )
)]
/// Get the public key of a certificate
pub async fn key<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
) -> Result<Json<String>> {
    let certificate = load(&state, &auth, &path, Acl::Read).await?;
    let key = state
        .certificate_service()
        .get_public_key(&certificate.id)
        .await?;
    Ok(Json(key))
}

#[utoipa::path(
    get,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates/{certificate}/keys",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("certificate" = String, Path, description = "Certificate id"),
    ),
    responses(
        (status = 200, description = "Public keys in every supported format", body = [CertificateKey]),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or certificate not found")
    )
)]
/// Get the public keys of a certificate
pub async fn keys<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
) -> Result<Json<Vec<CertificateKey>>> {
    let certificate = load(&state, &auth, &path, Acl::Read).await?;
    let keys = state
        .certificate_service()
        .get_public_keys(&certificate.id)
        .await?;
    Ok(Json(keys))
}

#[utoipa::path(
    put,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates/{certificate}",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("certificate" = String, Path, description = "Certificate id"),
    ),
    request_body = UpdateCertificate,
    responses(
        (status = 200, description = "Certificate updated", body = Certificate),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or certificate not found")
    )
)]
/// Update a certificate
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
    Json(input): Json<UpdateCertificate>,
) -> Result<Json<Certificate>> {
    let certificate = load(&state, &auth, &path, Acl::Update).await?;
    let updated = state
        .certificate_service()
        .update(&certificate.domain, &certificate.id, input, &auth)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/management/organizations/{organizationId}/environments/{environmentId}/domains/{domain}/certificates/{certificate}",
    tag = "Certificates",
    params(
        ("organizationId" = String, Path, description = "Organization id"),
        ("environmentId" = String, Path, description = "Environment id"),
        ("domain" = String, Path, description = "Domain id"),
        ("certificate" = String, Path, description = "Certificate id"),
    ),
    responses(
        (status = 204, description = "Certificate deleted"),
        (status = 400, description = "Certificate still used by applications"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Domain or certificate not found")
    )
)]
/// Delete a certificate
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(path): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse> {
    let certificate = load(&state, &auth, &path, Acl::Delete).await?;
    state
        .certificate_service()
        .delete(&certificate.id, &auth)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
