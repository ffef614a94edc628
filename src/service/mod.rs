//! Service seam consumed by the HTTP handlers
//!
//! Each trait is implemented by the in-memory backend in `crate::memory` and
//! mocked with `mockall` in unit tests.

pub mod application;
pub mod audit;
pub mod authorization_engine;
pub mod certificate;
pub mod domain;
pub mod identity_provider;
pub mod membership;
pub mod password_policy;
pub mod permission;
pub mod policy;
pub mod user;

pub use application::ApplicationService;
pub use audit::AuditService;
pub use authorization_engine::AuthorizationEngineService;
pub use certificate::CertificateService;
pub use domain::DomainService;
pub use identity_provider::IdentityProviderService;
pub use membership::MembershipService;
pub use password_policy::PasswordPolicyService;
pub use permission::PermissionService;
pub use policy::PolicyService;
pub use user::UserService;
