//! Application state traits for dependency injection
//!
//! Handlers are generic over `HasServices` so the same code runs against the
//! production wiring and against test states.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::service::{
    ApplicationService, AuditService, AuthorizationEngineService, CertificateService,
    DomainService, IdentityProviderService, MembershipService, PasswordPolicyService,
    PermissionService, PolicyService, UserService,
};

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    type Domains: DomainService;
    type Applications: ApplicationService;
    type Certificates: CertificateService;
    type IdentityProviders: IdentityProviderService;
    type Users: UserService;
    type Policies: PolicyService;
    type Memberships: MembershipService;
    type Permissions: PermissionService;
    type PasswordPolicies: PasswordPolicyService;
    type AuthorizationEngines: AuthorizationEngineService;
    type Audits: AuditService;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the JWT manager
    fn jwt_manager(&self) -> &JwtManager;

    fn domain_service(&self) -> &Self::Domains;
    fn application_service(&self) -> &Self::Applications;
    fn certificate_service(&self) -> &Self::Certificates;
    fn identity_provider_service(&self) -> &Self::IdentityProviders;
    fn user_service(&self) -> &Self::Users;
    fn policy_service(&self) -> &Self::Policies;
    fn membership_service(&self) -> &Self::Memberships;
    fn permission_service(&self) -> &Self::Permissions;
    fn password_policy_service(&self) -> &Self::PasswordPolicies;
    fn authorization_engine_service(&self) -> &Self::AuthorizationEngines;
    fn audit_service(&self) -> &Self::Audits;

    /// Check if the backing store is able to serve requests
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
