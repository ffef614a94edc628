//! In-memory reference backend for the service traits
//!
//! All services share one `MemoryStore`; a single lock over `StoreData` keeps
//! cross-resource invariants (cascades, reference checks, audits) atomic.

mod application;
mod audit;
mod authorization_engine;
mod certificate;
mod domain;
mod identity_provider;
mod membership;
mod password_policy;
mod policy;
mod user;

pub use application::MemoryApplicationService;
pub use audit::MemoryAuditService;
pub use authorization_engine::MemoryAuthorizationEngineService;
pub use certificate::MemoryCertificateService;
pub use domain::MemoryDomainService;
pub use identity_provider::MemoryIdentityProviderService;
pub use membership::{MemoryMembershipService, MemoryPermissionService};
pub use password_policy::MemoryPasswordPolicyService;
pub use policy::MemoryPolicyService;
pub use user::MemoryUserService;

use crate::config::BootstrapConfig;
use crate::domain::audit::{AuditEntity, AuditOutcome, STATUS_SUCCESS};
use crate::domain::role::{
    APPLICATION_OWNER, APPLICATION_PRIMARY_OWNER, APPLICATION_USER, DOMAIN_OWNER,
    DOMAIN_PRIMARY_OWNER, DOMAIN_USER, ORGANIZATION_ADMIN, ORGANIZATION_USER,
};
use crate::domain::{
    new_id, Acl, Application, Audit, AuthorizationEngine, Certificate, Domain, IdentityProvider,
    MemberType, Membership, PasswordPolicy, Permission, PermissionMap, Policy, ReferenceType,
    Role, User,
};
use crate::middleware::auth::AuthUser;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Organization user known to the backend, used for membership metadata
#[derive(Debug, Clone)]
pub(crate) struct OrganizationUser {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct StoreData {
    pub domains: HashMap<String, Domain>,
    pub applications: HashMap<String, Application>,
    pub certificates: HashMap<String, Certificate>,
    pub identity_providers: HashMap<String, IdentityProvider>,
    pub users: HashMap<String, User>,
    pub policies: HashMap<String, Policy>,
    pub memberships: HashMap<String, Membership>,
    pub roles: HashMap<String, Role>,
    pub password_policies: HashMap<String, PasswordPolicy>,
    pub authorization_engines: HashMap<String, AuthorizationEngine>,
    pub audits: Vec<Audit>,
    pub organization_users: HashMap<String, OrganizationUser>,
}

impl StoreData {
    /// Append a successful audit record for `principal` acting on `target`
    pub fn record(
        &mut self,
        reference_type: ReferenceType,
        reference_id: &str,
        event_type: &str,
        principal: &AuthUser,
        target: AuditEntity,
    ) {
        self.remember(principal);
        metrics::counter!("am_management_audit_events_total", "event_type" => event_type.to_string())
            .increment(1);
        self.audits.push(Audit {
            id: new_id(),
            reference_type,
            reference_id: reference_id.to_string(),
            event_type: event_type.to_string(),
            actor: AuditEntity {
                id: principal.user_id.clone(),
                entity_type: "USER".to_string(),
                display_name: Some(principal.display().to_string()),
            },
            target: Some(target),
            outcome: AuditOutcome {
                status: STATUS_SUCCESS.to_string(),
                message: None,
            },
            timestamp: Utc::now(),
        });
    }

    pub fn remember(&mut self, principal: &AuthUser) {
        self.organization_users
            .entry(principal.user_id.clone())
            .or_insert_with(|| OrganizationUser {
                id: principal.user_id.clone(),
                username: principal.username.clone(),
                display_name: principal.display_name.clone(),
            });
    }

    /// Attach `role` to a user on a reference, replacing any previous role
    pub fn grant(
        &mut self,
        member_id: &str,
        reference_type: ReferenceType,
        reference_id: &str,
        role: &str,
    ) -> Membership {
        let now = Utc::now();
        let existing = self.memberships.values_mut().find(|m| {
            m.member_type == MemberType::User
                && m.member_id == member_id
                && m.is_on(reference_type, reference_id)
        });
        if let Some(membership) = existing {
            membership.role = role.to_string();
            membership.updated_at = now;
            return membership.clone();
        }

        let membership = Membership {
            id: new_id(),
            member_id: member_id.to_string(),
            member_type: MemberType::User,
            reference_type,
            reference_id: reference_id.to_string(),
            role: role.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.memberships
            .insert(membership.id.clone(), membership.clone());
        membership
    }

    pub fn remove_memberships_on(&mut self, reference_type: ReferenceType, reference_id: &str) {
        self.memberships
            .retain(|_, m| !m.is_on(reference_type, reference_id));
    }

    pub fn domain_exists(&self, domain: &str) -> bool {
        self.domains.contains_key(domain)
    }
}

/// Shared state behind every `Memory*Service`
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Create a store seeded with the system roles and the bootstrap administrator
    pub fn new(bootstrap: &BootstrapConfig) -> Arc<Self> {
        let mut data = StoreData::default();
        for role in system_roles(&bootstrap.organization_id) {
            data.roles.insert(role.id.clone(), role);
        }
        data.organization_users.insert(
            bootstrap.admin_user_id.clone(),
            OrganizationUser {
                id: bootstrap.admin_user_id.clone(),
                username: bootstrap.admin_username.clone(),
                display_name: None,
            },
        );
        data.grant(
            &bootstrap.admin_user_id,
            ReferenceType::Organization,
            &bootstrap.organization_id,
            ORGANIZATION_ADMIN,
        );

        tracing::info!(
            organization_id = %bootstrap.organization_id,
            admin_user_id = %bootstrap.admin_user_id,
            "Seeded in-memory store"
        );

        Arc::new(Self {
            data: RwLock::new(data),
        })
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.data.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.data.write().await
    }

    /// The store is ready whenever its lock can be taken
    pub async fn is_ready(&self) -> bool {
        let _guard = self.data.read().await;
        true
    }
}

fn acls_except(excluded: &[Acl]) -> HashSet<Acl> {
    Acl::ALL
        .into_iter()
        .filter(|acl| !excluded.contains(acl))
        .collect()
}

fn role(
    id: &str,
    organization_id: &str,
    assignable_type: ReferenceType,
    permission_acls: PermissionMap,
) -> Role {
    Role {
        id: id.to_string(),
        name: id.replace('-', "_").to_uppercase(),
        description: None,
        reference_type: ReferenceType::Organization,
        reference_id: organization_id.to_string(),
        assignable_type,
        system: true,
        permission_acls,
    }
}

fn system_roles(organization_id: &str) -> Vec<Role> {
    let domain_permissions = || Permission::ALL.into_iter().filter(Permission::is_domain_scoped);
    let application_permissions =
        || Permission::ALL.into_iter().filter(Permission::is_application_scoped);

    let org_admin = Permission::ALL.into_iter().map(|p| (p, Acl::all())).collect();
    let org_user = PermissionMap::from([
        (Permission::Organization, [Acl::Read].into_iter().collect()),
        (Permission::Environment, Acl::read_only()),
        (Permission::Domain, [Acl::List].into_iter().collect()),
    ]);

    let domain_primary_owner = domain_permissions().map(|p| (p, Acl::all())).collect();
    let domain_owner = domain_permissions()
        .map(|p| {
            let acls = if p == Permission::Domain {
                acls_except(&[Acl::Delete])
            } else {
                Acl::all()
            };
            (p, acls)
        })
        .collect();
    let domain_user = domain_permissions().map(|p| (p, Acl::read_only())).collect();

    let app_primary_owner = application_permissions().map(|p| (p, Acl::all())).collect();
    let app_owner = application_permissions()
        .map(|p| {
            let acls = if p == Permission::Application {
                acls_except(&[Acl::Delete])
            } else {
                Acl::all()
            };
            (p, acls)
        })
        .collect();
    let app_user = application_permissions()
        .map(|p| (p, Acl::read_only()))
        .collect();

    vec![
        role(ORGANIZATION_ADMIN, organization_id, ReferenceType::Organization, org_admin),
        role(ORGANIZATION_USER, organization_id, ReferenceType::Organization, org_user),
        role(DOMAIN_PRIMARY_OWNER, organization_id, ReferenceType::Domain, domain_primary_owner),
        role(DOMAIN_OWNER, organization_id, ReferenceType::Domain, domain_owner),
        role(DOMAIN_USER, organization_id, ReferenceType::Domain, domain_user),
        role(
            APPLICATION_PRIMARY_OWNER,
            organization_id,
            ReferenceType::Application,
            app_primary_owner,
        ),
        role(APPLICATION_OWNER, organization_id, ReferenceType::Application, app_owner),
        role(APPLICATION_USER, organization_id, ReferenceType::Application, app_user),
    ]
}

/// Not-found error worded the way every resource reports it
pub(crate) fn not_found(kind: &str, id: &str) -> crate::error::AppError {
    crate::error::AppError::NotFound(format!("{} [{}] can not be found.", kind, id))
}

/// Slice a sorted list into one 0-based page
pub(crate) fn paginate<T: Clone>(items: &[T], page: u32, size: u32) -> Vec<T> {
    let start = (page as usize).saturating_mul(size as usize);
    items
        .iter()
        .skip(start)
        .take(size as usize)
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn bootstrap() -> BootstrapConfig {
        BootstrapConfig::default()
    }

    pub fn store() -> Arc<MemoryStore> {
        MemoryStore::new(&bootstrap())
    }

    pub fn admin() -> AuthUser {
        AuthUser {
            user_id: "admin".to_string(),
            username: "admin".to_string(),
            display_name: Some("Administrator".to_string()),
            organization_id: "DEFAULT".to_string(),
        }
    }

    pub fn principal(id: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            username: id.to_string(),
            display_name: None,
            organization_id: "DEFAULT".to_string(),
        }
    }
}
