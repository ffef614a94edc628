//! Permission resolution service

use crate::domain::{PermissionMap, ReferenceType};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Every permission the principal holds directly on the reference
    async fn find_all_permissions(
        &self,
        principal: &AuthUser,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<PermissionMap>;
}
