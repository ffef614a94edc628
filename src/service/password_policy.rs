//! Password policy service

use crate::domain::{NewPasswordPolicy, PasswordPolicy, UpdatePasswordPolicy};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordPolicyService: Send + Sync {
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<PasswordPolicy>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<PasswordPolicy>>;
    async fn create(
        &self,
        domain: &str,
        input: NewPasswordPolicy,
        principal: &AuthUser,
    ) -> Result<PasswordPolicy>;
    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdatePasswordPolicy,
        principal: &AuthUser,
    ) -> Result<PasswordPolicy>;
    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()>;
    /// Make this policy the only default of its domain
    async fn set_default(
        &self,
        domain: &str,
        id: &str,
        principal: &AuthUser,
    ) -> Result<PasswordPolicy>;
}
