//! In-memory extension point policy service

use super::{not_found, MemoryStore};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::{new_id, NewPolicy, Policy, PolicyReorder, ReferenceType, UpdatePolicy};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::PolicyService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn audit_target(policy: &Policy) -> AuditEntity {
    AuditEntity {
        id: policy.id.clone(),
        entity_type: "POLICY".to_string(),
        display_name: Some(policy.name.clone()),
    }
}

pub struct MemoryPolicyService {
    store: Arc<MemoryStore>,
}

impl MemoryPolicyService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PolicyService for MemoryPolicyService {
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<Policy>> {
        let data = self.store.read().await;
        let mut policies: Vec<Policy> = data
            .policies
            .values()
            .filter(|p| p.domain == domain)
            .cloned()
            .collect();
        policies.sort_by(|a, b| {
            (a.extension_point, a.order, &a.name).cmp(&(b.extension_point, b.order, &b.name))
        });
        Ok(policies)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Policy>> {
        Ok(self.store.read().await.policies.get(id).cloned())
    }

    async fn create(&self, domain: &str, input: NewPolicy, principal: &AuthUser) -> Result<Policy> {
        input.validate()?;

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }

        let order = match input.order {
            Some(order) => order,
            None => match data
                .policies
                .values()
                .filter(|p| p.domain == domain && p.extension_point == input.extension_point)
                .map(|p| p.order)
                .max()
            {
                Some(last) => last.checked_add(1).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "No order left after [{}] for extension point",
                        last
                    ))
                })?,
                None => 0,
            },
        };

        let now = Utc::now();
        let policy = Policy {
            id: new_id(),
            name: input.name,
            policy_type: input.policy_type,
            extension_point: input.extension_point,
            enabled: input.enabled,
            order,
            configuration: input.configuration,
            domain: domain.to_string(),
            created_at: now,
            updated_at: now,
        };
        data.policies.insert(policy.id.clone(), policy.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::POLICY_CREATED,
            principal,
            audit_target(&policy),
        );

        tracing::info!(domain_id = %domain, policy_id = %policy.id, "Policy created");
        Ok(policy)
    }

    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdatePolicy,
        principal: &AuthUser,
    ) -> Result<Policy> {
        input.validate()?;

        let mut data = self.store.write().await;
        let policy = data
            .policies
            .get_mut(id)
            .filter(|p| p.domain == domain)
            .ok_or_else(|| not_found("Policy", id))?;

        policy.name = input.name;
        policy.enabled = input.enabled;
        if let Some(order) = input.order {
            policy.order = order;
        }
        policy.configuration = input.configuration;
        policy.updated_at = Utc::now();
        let policy = policy.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::POLICY_UPDATED,
            principal,
            audit_target(&policy),
        );
        Ok(policy)
    }

    async fn update_all(
        &self,
        domain: &str,
        entries: Vec<PolicyReorder>,
        principal: &AuthUser,
    ) -> Result<Vec<Policy>> {
        let mut data = self.store.write().await;
        if let Some(foreign) = entries.iter().find(|entry| {
            !data
                .policies
                .get(&entry.id)
                .is_some_and(|p| p.domain == domain)
        }) {
            return Err(AppError::BadRequest(format!(
                "Policy [{}] does not belong to domain [{}]",
                foreign.id, domain
            )));
        }

        let now = Utc::now();
        let mut updated = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(policy) = data.policies.get_mut(&entry.id) {
                if let Some(enabled) = entry.enabled {
                    policy.enabled = enabled;
                }
                if let Some(order) = entry.order {
                    policy.order = order;
                }
                if let Some(extension_point) = entry.extension_point {
                    policy.extension_point = extension_point;
                }
                policy.updated_at = now;
                updated.push(policy.clone());
            }
        }
        for policy in &updated {
            data.record(
                ReferenceType::Domain,
                domain,
                event_type::POLICY_UPDATED,
                principal,
                audit_target(policy),
            );
        }

        tracing::info!(domain_id = %domain, count = updated.len(), "Policies updated");
        Ok(updated)
    }

    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let policy = data
            .policies
            .get(id)
            .filter(|p| p.domain == domain)
            .cloned()
            .ok_or_else(|| not_found("Policy", id))?;

        data.policies.remove(id);
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::POLICY_DELETED,
            principal,
            audit_target(&policy),
        );

        tracing::info!(domain_id = %domain, policy_id = %id, "Policy deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::MemoryDomainService;
    use super::*;
    use crate::domain::{ExtensionPoint, NewDomain};
    use crate::service::DomainService;

    async fn setup() -> (MemoryPolicyService, String) {
        let store = store();
        let domain = MemoryDomainService::new(store.clone())
            .create(
                "DEFAULT",
                "DEFAULT",
                NewDomain {
                    name: "Policies".to_string(),
                    description: None,
                },
                &admin(),
            )
            .await
            .unwrap();
        (MemoryPolicyService::new(store), domain.id)
    }

    fn new_policy(name: &str, extension_point: ExtensionPoint, order: Option<i32>) -> NewPolicy {
        NewPolicy {
            name: name.to_string(),
            policy_type: "groovy".to_string(),
            extension_point,
            enabled: true,
            order,
            configuration: serde_json::json!({"script": ""}),
        }
    }

    #[tokio::test]
    async fn test_policy_without_order_goes_last() {
        let (service, domain) = setup().await;
        service
            .create(&domain, new_policy("a", ExtensionPoint::PreLogin, Some(4)), &admin())
            .await
            .unwrap();
        let appended = service
            .create(&domain, new_policy("b", ExtensionPoint::PreLogin, None), &admin())
            .await
            .unwrap();
        assert_eq!(appended.order, 5);

        let first_elsewhere = service
            .create(&domain, new_policy("c", ExtensionPoint::PostLogin, None), &admin())
            .await
            .unwrap();
        assert_eq!(first_elsewhere.order, 0);
    }

    #[tokio::test]
    async fn test_policy_after_max_order_is_rejected() {
        let (service, domain) = setup().await;
        service
            .create(&domain, new_policy("a", ExtensionPoint::PreLogin, Some(i32::MAX)), &admin())
            .await
            .unwrap();

        let err = service
            .create(&domain, new_policy("b", ExtensionPoint::PreLogin, None), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let explicit = service
            .create(&domain, new_policy("c", ExtensionPoint::PreLogin, Some(3)), &admin())
            .await
            .unwrap();
        assert_eq!(explicit.order, 3);
    }

    #[tokio::test]
    async fn test_update_all_rejects_foreign_policy() {
        let (service, domain) = setup().await;
        let policy = service
            .create(&domain, new_policy("a", ExtensionPoint::PreLogin, None), &admin())
            .await
            .unwrap();

        let err = service
            .update_all(
                &domain,
                vec![PolicyReorder {
                    id: "unknown".to_string(),
                    enabled: None,
                    order: Some(1),
                    extension_point: None,
                }],
                &admin(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let updated = service
            .update_all(
                &domain,
                vec![PolicyReorder {
                    id: policy.id.clone(),
                    enabled: Some(false),
                    order: Some(7),
                    extension_point: None,
                }],
                &admin(),
            )
            .await
            .unwrap();
        assert_eq!(updated[0].order, 7);
        assert!(!updated[0].enabled);
    }

    #[tokio::test]
    async fn test_find_by_domain_sorted_by_order() {
        let (service, domain) = setup().await;
        for (name, order) in [("late", 3), ("early", 1)] {
            service
                .create(&domain, new_policy(name, ExtensionPoint::PreLogin, Some(order)), &admin())
                .await
                .unwrap();
        }
        let names: Vec<_> = service
            .find_by_domain(&domain)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_delete_checks_domain() {
        let (service, domain) = setup().await;
        let policy = service
            .create(&domain, new_policy("a", ExtensionPoint::Root, None), &admin())
            .await
            .unwrap();
        assert!(matches!(
            service.delete("other", &policy.id, &admin()).await,
            Err(AppError::NotFound(_))
        ));
        service.delete(&domain, &policy.id, &admin()).await.unwrap();
    }
}
