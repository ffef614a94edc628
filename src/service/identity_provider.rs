//! Identity provider service

use crate::domain::{IdentityProvider, NewIdentityProvider, UpdateIdentityProvider};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProviderService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityProvider>>;
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<IdentityProvider>>;
    async fn create(
        &self,
        domain: &str,
        input: NewIdentityProvider,
        principal: &AuthUser,
    ) -> Result<IdentityProvider>;
    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateIdentityProvider,
        principal: &AuthUser,
    ) -> Result<IdentityProvider>;
    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()>;
    /// Whether providers of this type can store and manage users
    fn is_user_provider(&self, provider_type: &str) -> bool;
}
