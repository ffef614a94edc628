//! Membership service

use crate::domain::{Membership, MembershipListItem, NewMembership, ReferenceType};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Membership>>;
    /// Memberships on a reference with the users, groups and roles they point to
    async fn find_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<MembershipListItem>;
    /// Add the member, or change its role when it already has a membership
    async fn add_or_update_member(
        &self,
        organization_id: &str,
        reference_type: ReferenceType,
        reference_id: &str,
        input: NewMembership,
        principal: &AuthUser,
    ) -> Result<Membership>;
    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()>;
}
