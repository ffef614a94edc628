//! Audit trail service

use crate::domain::{Audit, AuditQuery, ReferenceType};
use crate::error::Result;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Audits of a reference, newest first; returns the page and the total
    async fn search(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
        query: AuditQuery,
        page: u32,
        size: u32,
    ) -> Result<(Vec<Audit>, u64)>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Audit>>;
}
