//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates the handler path annotations and domain schemas into a single
//! specification. Swagger UI is served outside production.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AM Management API",
        version = "0.3.0",
        description = "Administration API for security domains and their resources",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Domains", description = "Security domains of an environment"),
        (name = "Applications", description = "Client applications of a domain"),
        (name = "Certificates", description = "Signing and encryption certificates"),
        (name = "Identity providers", description = "User sources and social providers"),
        (name = "Users", description = "Domain users"),
        (name = "Policies", description = "Extension point policies"),
        (name = "Members", description = "Domain and application memberships"),
        (name = "Password policies", description = "Password rules of a domain"),
        (name = "Authorization engines", description = "External authorization engines"),
        (name = "Audits", description = "Audit trail of a domain"),
    ),
    security(
        ("bearer_jwt" = [])
    ),
    components(
        schemas(
            crate::api::PageQuery,
            crate::api::health::HealthResponse,

            crate::domain::ReferenceType,
            crate::domain::Permission,
            crate::domain::Acl,

            crate::domain::Domain,
            crate::domain::VirtualHost,
            crate::domain::NewDomain,
            crate::domain::PatchDomain,
            crate::domain::Entrypoint,

            crate::domain::Application,
            crate::domain::ApplicationType,
            crate::domain::ApplicationSettings,
            crate::domain::ApplicationOAuthSettings,
            crate::domain::ApplicationAdvancedSettings,
            crate::domain::NewApplication,
            crate::domain::PatchApplication,
            crate::domain::PatchApplicationSettings,
            crate::domain::PatchApplicationOAuthSettings,
            crate::domain::UpdateApplicationType,

            crate::domain::Certificate,
            crate::domain::CertificateKey,
            crate::domain::NewCertificate,
            crate::domain::UpdateCertificate,

            crate::domain::IdentityProvider,
            crate::domain::NewIdentityProvider,
            crate::domain::UpdateIdentityProvider,

            crate::domain::User,
            crate::domain::NewUser,
            crate::domain::UpdateUser,
            crate::domain::StatusEntity,
            crate::domain::PasswordValue,
            crate::domain::UsernameEntity,

            crate::domain::Policy,
            crate::domain::ExtensionPoint,
            crate::domain::NewPolicy,
            crate::domain::UpdatePolicy,
            crate::domain::PolicyReorder,

            crate::domain::Membership,
            crate::domain::MemberType,
            crate::domain::NewMembership,
            crate::domain::MembershipListItem,
            crate::domain::MembershipMetadata,

            crate::domain::PasswordPolicy,
            crate::domain::NewPasswordPolicy,

            crate::domain::AuthorizationEngine,
            crate::domain::NewAuthorizationEngine,
            crate::domain::UpdateAuthorizationEngine,

            crate::domain::Audit,
            crate::domain::AuditEntity,
            crate::domain::AuditOutcome,
        )
    ),
    paths(
        crate::api::health::health,
        crate::api::health::ready,

        crate::api::domain::list,
        crate::api::domain::create,
        crate::api::domain::get,
        crate::api::domain::get_by_hrid,
        crate::api::domain::patch,
        crate::api::domain::delete,
        crate::api::domain::entrypoints,

        crate::api::application::list,
        crate::api::application::create,
        crate::api::application::get,
        crate::api::application::patch,
        crate::api::application::update_type,
        crate::api::application::delete,
        crate::api::application::renew_secret,

        crate::api::certificate::list,
        crate::api::certificate::create,
        crate::api::certificate::rotate,
        crate::api::certificate::get,
        crate::api::certificate::key,
        crate::api::certificate::keys,
        crate::api::certificate::update,
        crate::api::certificate::delete,

        crate::api::identity_provider::list,
        crate::api::identity_provider::create,
        crate::api::identity_provider::get,
        crate::api::identity_provider::update,
        crate::api::identity_provider::delete,

        crate::api::user::list,
        crate::api::user::create,
        crate::api::user::get,
        crate::api::user::update,
        crate::api::user::delete,
        crate::api::user::update_status,
        crate::api::user::reset_password,
        crate::api::user::lock,
        crate::api::user::unlock,
        crate::api::user::update_username,

        crate::api::policy::list,
        crate::api::policy::create,
        crate::api::policy::update_all,
        crate::api::policy::get,
        crate::api::policy::update,
        crate::api::policy::delete,

        crate::api::member::list_domain,
        crate::api::member::add_domain,
        crate::api::member::remove_domain,
        crate::api::member::domain_permissions,
        crate::api::member::list_application,
        crate::api::member::add_application,
        crate::api::member::remove_application,
        crate::api::member::application_permissions,

        crate::api::password_policy::list,
        crate::api::password_policy::create,
        crate::api::password_policy::get,
        crate::api::password_policy::update,
        crate::api::password_policy::delete,
        crate::api::password_policy::set_default,

        crate::api::authorization_engine::list,
        crate::api::authorization_engine::create,
        crate::api::authorization_engine::get,
        crate::api::authorization_engine::update,
        crate::api::authorization_engine::delete,

        crate::api::audit::list,
        crate::api::audit::get,
    ),
)]
pub struct ApiDoc;

impl ApiDoc {
    /// The document with the bearer JWT security scheme registered
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(components) = doc.components.as_mut() {
            components.security_schemes.insert(
                "bearer_jwt".to_string(),
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
        doc
    }
}
