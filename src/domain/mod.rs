//! Domain models for the management API

pub mod application;
pub mod audit;
pub mod authorization_engine;
pub mod certificate;
pub mod common;
pub mod identity_provider;
pub mod membership;
pub mod password_policy;
pub mod permission;
pub mod policy;
pub mod role;
pub mod security_domain;
pub mod user;

pub use application::{
    Application, ApplicationAdvancedSettings, ApplicationOAuthSettings, ApplicationSettings,
    ApplicationType, NewApplication, PatchApplication, PatchApplicationOAuthSettings,
    PatchApplicationSettings, UpdateApplicationType,
};
pub use audit::{Audit, AuditEntity, AuditOutcome, AuditQuery};
pub use authorization_engine::{
    AuthorizationEngine, NewAuthorizationEngine, UpdateAuthorizationEngine,
};
pub use certificate::{Certificate, CertificateKey, NewCertificate, UpdateCertificate};
pub use common::{new_id, slugify, ReferenceType};
pub use identity_provider::{IdentityProvider, NewIdentityProvider, UpdateIdentityProvider};
pub use membership::{
    MemberType, Membership, MembershipListItem, MembershipMetadata, NewMembership,
};
pub use password_policy::{NewPasswordPolicy, PasswordPolicy, UpdatePasswordPolicy};
pub use permission::{merge_permissions, Acl, Permission, PermissionMap};
pub use policy::{ExtensionPoint, NewPolicy, Policy, PolicyReorder, UpdatePolicy};
pub use role::Role;
pub use security_domain::{Domain, Entrypoint, NewDomain, PatchDomain, VirtualHost};
pub use user::{NewUser, PasswordValue, StatusEntity, UpdateUser, User, UsernameEntity};
