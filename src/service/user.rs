//! Domain user service

use crate::domain::{NewUser, UpdateUser, User};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Page through a domain's users, optionally filtered; returns the page and the total
    async fn search(
        &self,
        domain: &str,
        query: Option<String>,
        page: u32,
        size: u32,
    ) -> Result<(Vec<User>, u64)>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn create(&self, domain: &str, input: NewUser, principal: &AuthUser) -> Result<User>;
    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateUser,
        principal: &AuthUser,
    ) -> Result<User>;
    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()>;
    async fn update_status(
        &self,
        domain: &str,
        id: &str,
        enabled: bool,
        principal: &AuthUser,
    ) -> Result<User>;
    async fn reset_password(
        &self,
        domain: &str,
        id: &str,
        password: String,
        principal: &AuthUser,
    ) -> Result<()>;
    async fn lock(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<User>;
    async fn unlock(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<User>;
    async fn update_username(
        &self,
        domain: &str,
        id: &str,
        username: String,
        principal: &AuthUser,
    ) -> Result<User>;
}
