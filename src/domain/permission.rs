//! Permissions and access control lists

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use utoipa::ToSchema;

/// Resource type a role grants access to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Organization,
    Environment,
    Domain,
    DomainSettings,
    DomainOpenid,
    DomainScim,
    DomainUma,
    DomainCertificate,
    DomainIdentityProvider,
    DomainUser,
    DomainExtensionPoint,
    DomainMember,
    DomainAudit,
    DomainAuthorizationEngine,
    Application,
    ApplicationSettings,
    ApplicationOpenid,
    ApplicationIdentityProvider,
    ApplicationCertificate,
    ApplicationFactor,
    ApplicationMember,
}

impl Permission {
    pub const ALL: [Permission; 21] = [
        Permission::Organization,
        Permission::Environment,
        Permission::Domain,
        Permission::DomainSettings,
        Permission::DomainOpenid,
        Permission::DomainScim,
        Permission::DomainUma,
        Permission::DomainCertificate,
        Permission::DomainIdentityProvider,
        Permission::DomainUser,
        Permission::DomainExtensionPoint,
        Permission::DomainMember,
        Permission::DomainAudit,
        Permission::DomainAuthorizationEngine,
        Permission::Application,
        Permission::ApplicationSettings,
        Permission::ApplicationOpenid,
        Permission::ApplicationIdentityProvider,
        Permission::ApplicationCertificate,
        Permission::ApplicationFactor,
        Permission::ApplicationMember,
    ];

    /// Permissions that only make sense on a domain or below
    pub fn is_domain_scoped(&self) -> bool {
        !matches!(self, Permission::Organization | Permission::Environment)
    }

    /// Permissions that only make sense on an application
    pub fn is_application_scoped(&self) -> bool {
        matches!(
            self,
            Permission::Application
                | Permission::ApplicationSettings
                | Permission::ApplicationOpenid
                | Permission::ApplicationIdentityProvider
                | Permission::ApplicationCertificate
                | Permission::ApplicationFactor
                | Permission::ApplicationMember
        )
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = serde_json::to_value(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", value.as_str().unwrap_or_default())
    }
}

/// Operation allowed on a permission
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Acl {
    Create,
    Read,
    List,
    Update,
    Delete,
}

impl Acl {
    pub const ALL: [Acl; 5] = [Acl::Create, Acl::Read, Acl::List, Acl::Update, Acl::Delete];

    pub fn all() -> HashSet<Acl> {
        Self::ALL.into_iter().collect()
    }

    pub fn read_only() -> HashSet<Acl> {
        [Acl::Read, Acl::List].into_iter().collect()
    }
}

/// Permission to granted acls, as resolved for one principal on one reference
pub type PermissionMap = HashMap<Permission, HashSet<Acl>>;

/// Union `other` into `target`
pub fn merge_permissions(target: &mut PermissionMap, other: &PermissionMap) {
    for (permission, acls) in other {
        target
            .entry(*permission)
            .or_default()
            .extend(acls.iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_serialization() {
        assert_eq!(
            serde_json::to_string(&Permission::DomainIdentityProvider).unwrap(),
            "\"DOMAIN_IDENTITY_PROVIDER\""
        );
        assert_eq!(Permission::ApplicationOpenid.to_string(), "APPLICATION_OPENID");
        let parsed: Permission = serde_json::from_str("\"DOMAIN_AUTHORIZATION_ENGINE\"").unwrap();
        assert_eq!(parsed, Permission::DomainAuthorizationEngine);
    }

    #[test]
    fn test_permission_scopes() {
        assert!(!Permission::Organization.is_domain_scoped());
        assert!(Permission::DomainUser.is_domain_scoped());
        assert!(Permission::ApplicationFactor.is_application_scoped());
        assert!(!Permission::DomainUser.is_application_scoped());
    }

    #[test]
    fn test_merge_permissions() {
        let mut target = PermissionMap::new();
        target.insert(Permission::Domain, [Acl::Read].into_iter().collect());

        let mut other = PermissionMap::new();
        other.insert(Permission::Domain, [Acl::Update].into_iter().collect());
        other.insert(Permission::DomainUser, Acl::read_only());

        merge_permissions(&mut target, &other);

        assert_eq!(target[&Permission::Domain].len(), 2);
        assert!(target[&Permission::DomainUser].contains(&Acl::List));
    }

    #[test]
    fn test_acl_sets() {
        assert_eq!(Acl::all().len(), 5);
        assert!(!Acl::read_only().contains(&Acl::Delete));
    }
}
