//! Authorization engine service

use crate::domain::{AuthorizationEngine, NewAuthorizationEngine, UpdateAuthorizationEngine};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationEngineService: Send + Sync {
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<AuthorizationEngine>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<AuthorizationEngine>>;
    async fn create(
        &self,
        domain: &str,
        input: NewAuthorizationEngine,
        principal: &AuthUser,
    ) -> Result<AuthorizationEngine>;
    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateAuthorizationEngine,
        principal: &AuthUser,
    ) -> Result<AuthorizationEngine>;
    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()>;
}
