//! In-memory audit trail

use super::{paginate, MemoryStore};
use crate::domain::{Audit, AuditQuery, ReferenceType};
use crate::error::Result;
use crate::service::AuditService;
use async_trait::async_trait;
use std::sync::Arc;

pub struct MemoryAuditService {
    store: Arc<MemoryStore>,
}

impl MemoryAuditService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditService for MemoryAuditService {
    async fn search(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
        query: AuditQuery,
        page: u32,
        size: u32,
    ) -> Result<(Vec<Audit>, u64)> {
        let data = self.store.read().await;
        // Records are appended in time order
        let audits: Vec<Audit> = data
            .audits
            .iter()
            .rev()
            .filter(|a| a.reference_type == reference_type && a.reference_id == reference_id)
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        let total = audits.len() as u64;
        Ok((paginate(&audits, page, size), total))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Audit>> {
        let data = self.store.read().await;
        Ok(data.audits.iter().find(|a| a.id == id).cloned())
    }
}
