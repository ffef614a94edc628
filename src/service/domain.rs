//! Security domain service

use crate::domain::{Domain, NewDomain, PatchDomain};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Domain>>;
    async fn find_by_hrid(&self, environment_id: &str, hrid: &str) -> Result<Option<Domain>>;
    async fn find_all_by_environment(&self, environment_id: &str) -> Result<Vec<Domain>>;
    /// Create a domain together with its default identity provider and certificate.
    /// The principal becomes the domain's primary owner.
    async fn create(
        &self,
        organization_id: &str,
        environment_id: &str,
        input: NewDomain,
        principal: &AuthUser,
    ) -> Result<Domain>;
    async fn patch(&self, id: &str, input: PatchDomain, principal: &AuthUser) -> Result<Domain>;
    /// Delete a domain and everything attached to it
    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()>;
}
