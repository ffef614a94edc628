//! In-memory membership and permission services

use super::{not_found, MemoryStore, StoreData};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::{
    merge_permissions, new_id, MemberType, Membership, MembershipListItem, MembershipMetadata,
    NewMembership, PermissionMap, ReferenceType,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::{MembershipService, PermissionService};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

fn audit_target(membership: &Membership) -> AuditEntity {
    AuditEntity {
        id: membership.id.clone(),
        entity_type: "MEMBERSHIP".to_string(),
        display_name: Some(membership.member_id.clone()),
    }
}

/// Audits of application memberships are filed under the owning domain
fn audit_reference(data: &StoreData, membership: &Membership) -> (ReferenceType, String) {
    match membership.reference_type {
        ReferenceType::Application => data
            .applications
            .get(&membership.reference_id)
            .map(|a| (ReferenceType::Domain, a.domain.clone()))
            .unwrap_or((membership.reference_type, membership.reference_id.clone())),
        other => (other, membership.reference_id.clone()),
    }
}

pub struct MemoryMembershipService {
    store: Arc<MemoryStore>,
}

impl MemoryMembershipService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MembershipService for MemoryMembershipService {
    async fn find_by_id(&self, id: &str) -> Result<Option<Membership>> {
        Ok(self.store.read().await.memberships.get(id).cloned())
    }

    async fn find_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<MembershipListItem> {
        let data = self.store.read().await;
        let mut memberships: Vec<Membership> = data
            .memberships
            .values()
            .filter(|m| m.is_on(reference_type, reference_id))
            .cloned()
            .collect();
        memberships.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut metadata = MembershipMetadata::default();
        for membership in &memberships {
            match membership.member_type {
                MemberType::User => {
                    let user = match data.organization_users.get(&membership.member_id) {
                        Some(user) => json!({
                            "id": user.id,
                            "username": user.username,
                            "displayName": user.display_name,
                        }),
                        None => json!({"id": membership.member_id}),
                    };
                    metadata.users.insert(membership.member_id.clone(), user);
                }
                MemberType::Group => {
                    metadata
                        .groups
                        .insert(membership.member_id.clone(), json!({"id": membership.member_id}));
                }
            }
            if let Some(role) = data.roles.get(&membership.role) {
                metadata.roles.insert(
                    role.id.clone(),
                    json!({
                        "id": role.id,
                        "name": role.name,
                        "system": role.system,
                        "assignableType": role.assignable_type,
                    }),
                );
            }
        }

        Ok(MembershipListItem {
            memberships,
            metadata,
        })
    }

    async fn add_or_update_member(
        &self,
        organization_id: &str,
        reference_type: ReferenceType,
        reference_id: &str,
        input: NewMembership,
        principal: &AuthUser,
    ) -> Result<Membership> {
        input.validate()?;

        let mut data = self.store.write().await;
        let role = data
            .roles
            .get(&input.role)
            .filter(|r| r.reference_id == organization_id)
            .ok_or_else(|| AppError::BadRequest(format!("Role [{}] can not be found.", input.role)))?;
        if role.is_primary_owner() {
            return Err(AppError::BadRequest(
                "Role [PRIMARY_OWNER] is reserved and cannot be assigned".to_string(),
            ));
        }
        if role.assignable_type != reference_type {
            return Err(AppError::BadRequest(format!(
                "Role [{}] is not assignable to {}",
                input.role, reference_type
            )));
        }

        let now = Utc::now();
        let existing = data
            .memberships
            .values()
            .find(|m| {
                m.member_id == input.member_id
                    && m.member_type == input.member_type
                    && m.is_on(reference_type, reference_id)
            })
            .map(|m| (m.id.clone(), m.role.clone()));
        let (membership, event) = match existing {
            Some((id, current_role)) => {
                if data
                    .roles
                    .get(&current_role)
                    .is_some_and(|r| r.is_primary_owner())
                {
                    return Err(AppError::BadRequest(
                        "The primary owner role cannot be changed".to_string(),
                    ));
                }
                let membership = data
                    .memberships
                    .get_mut(&id)
                    .ok_or_else(|| not_found("Membership", &id))?;
                membership.role = input.role;
                membership.updated_at = now;
                (membership.clone(), event_type::MEMBERSHIP_UPDATED)
            }
            None => {
                let membership = Membership {
                    id: new_id(),
                    member_id: input.member_id,
                    member_type: input.member_type,
                    reference_type,
                    reference_id: reference_id.to_string(),
                    role: input.role,
                    created_at: now,
                    updated_at: now,
                };
                data.memberships
                    .insert(membership.id.clone(), membership.clone());
                (membership, event_type::MEMBERSHIP_CREATED)
            }
        };

        let (audit_type, audit_id) = audit_reference(&data, &membership);
        data.record(audit_type, &audit_id, event, principal, audit_target(&membership));

        tracing::info!(
            membership_id = %membership.id,
            reference_type = %reference_type,
            reference_id = %reference_id,
            role = %membership.role,
            "Membership saved"
        );
        Ok(membership)
    }

    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let membership = data
            .memberships
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Membership", id))?;
        if data
            .roles
            .get(&membership.role)
            .is_some_and(|r| r.is_primary_owner())
        {
            return Err(AppError::BadRequest(
                "The primary owner cannot be removed".to_string(),
            ));
        }

        data.memberships.remove(id);
        let (audit_type, audit_id) = audit_reference(&data, &membership);
        data.record(
            audit_type,
            &audit_id,
            event_type::MEMBERSHIP_DELETED,
            principal,
            audit_target(&membership),
        );

        tracing::info!(membership_id = %id, "Membership deleted");
        Ok(())
    }
}

/// Resolves permissions from user memberships and their roles.
/// Group memberships are stored but not expanded.
pub struct MemoryPermissionService {
    store: Arc<MemoryStore>,
}

impl MemoryPermissionService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionService for MemoryPermissionService {
    async fn find_all_permissions(
        &self,
        principal: &AuthUser,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<PermissionMap> {
        let data = self.store.read().await;
        let mut permissions = PermissionMap::new();
        let roles = data
            .memberships
            .values()
            .filter(|m| {
                m.member_type == MemberType::User
                    && m.member_id == principal.user_id
                    && m.is_on(reference_type, reference_id)
            })
            .filter_map(|m| data.roles.get(&m.role));
        for role in roles {
            merge_permissions(&mut permissions, &role.permission_acls);
        }
        Ok(permissions)
    }
}
