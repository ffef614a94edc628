//! Certificate service

use crate::domain::{Certificate, CertificateKey, NewCertificate, UpdateCertificate};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>>;
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<Certificate>>;
    async fn create(
        &self,
        domain: &str,
        input: NewCertificate,
        principal: &AuthUser,
    ) -> Result<Certificate>;
    /// Create a fresh system certificate for the domain
    async fn rotate(&self, domain: &str, principal: &AuthUser) -> Result<Certificate>;
    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateCertificate,
        principal: &AuthUser,
    ) -> Result<Certificate>;
    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()>;
    async fn get_public_key(&self, id: &str) -> Result<String>;
    async fn get_public_keys(&self, id: &str) -> Result<Vec<CertificateKey>>;
}
