//! Extension point policy service

use crate::domain::{NewPolicy, Policy, PolicyReorder, UpdatePolicy};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyService: Send + Sync {
    /// Policies of a domain sorted by extension point then order
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<Policy>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Policy>>;
    async fn create(&self, domain: &str, input: NewPolicy, principal: &AuthUser) -> Result<Policy>;
    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdatePolicy,
        principal: &AuthUser,
    ) -> Result<Policy>;
    async fn update_all(
        &self,
        domain: &str,
        entries: Vec<PolicyReorder>,
        principal: &AuthUser,
    ) -> Result<Vec<Policy>>;
    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()>;
}
