//! Role models

use super::common::ReferenceType;
use super::permission::{Acl, Permission, PermissionMap};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ORGANIZATION_ADMIN: &str = "organization-admin";
pub const ORGANIZATION_USER: &str = "organization-user";
pub const DOMAIN_PRIMARY_OWNER: &str = "domain-primary-owner";
pub const DOMAIN_OWNER: &str = "domain-owner";
pub const DOMAIN_USER: &str = "domain-user";
pub const APPLICATION_PRIMARY_OWNER: &str = "application-primary-owner";
pub const APPLICATION_OWNER: &str = "application-owner";
pub const APPLICATION_USER: &str = "application-user";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    /// Reference type memberships using this role may be attached to
    pub assignable_type: ReferenceType,
    pub system: bool,
    #[schema(value_type = Object)]
    pub permission_acls: PermissionMap,
}

impl Role {
    pub fn is_primary_owner(&self) -> bool {
        self.id == DOMAIN_PRIMARY_OWNER || self.id == APPLICATION_PRIMARY_OWNER
    }

    pub fn grants(&self, permission: Permission, acl: Acl) -> bool {
        self.permission_acls
            .get(&permission)
            .map(|acls| acls.contains(&acl))
            .unwrap_or(false)
    }
}
