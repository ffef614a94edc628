//! Application service

use crate::domain::{Application, ApplicationType, NewApplication, PatchApplication};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Application>>;
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<Application>>;
    async fn create(
        &self,
        domain: &str,
        input: NewApplication,
        principal: &AuthUser,
    ) -> Result<Application>;
    async fn patch(
        &self,
        domain: &str,
        id: &str,
        input: PatchApplication,
        principal: &AuthUser,
    ) -> Result<Application>;
    /// Change the type and reset grant types to the new type's defaults
    async fn update_type(
        &self,
        domain: &str,
        id: &str,
        app_type: ApplicationType,
        principal: &AuthUser,
    ) -> Result<Application>;
    async fn renew_client_secret(
        &self,
        domain: &str,
        id: &str,
        principal: &AuthUser,
    ) -> Result<Application>;
    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()>;
}
