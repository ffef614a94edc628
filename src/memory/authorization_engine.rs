//! In-memory authorization engine service

use super::{not_found, MemoryStore};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::{
    new_id, AuthorizationEngine, NewAuthorizationEngine, ReferenceType, UpdateAuthorizationEngine,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::AuthorizationEngineService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn audit_target(engine: &AuthorizationEngine) -> AuditEntity {
    AuditEntity {
        id: engine.id.clone(),
        entity_type: "AUTHORIZATION_ENGINE".to_string(),
        display_name: Some(engine.name.clone()),
    }
}

pub struct MemoryAuthorizationEngineService {
    store: Arc<MemoryStore>,
}

impl MemoryAuthorizationEngineService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthorizationEngineService for MemoryAuthorizationEngineService {
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<AuthorizationEngine>> {
        let data = self.store.read().await;
        let mut engines: Vec<AuthorizationEngine> = data
            .authorization_engines
            .values()
            .filter(|e| e.domain == domain)
            .cloned()
            .collect();
        engines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(engines)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AuthorizationEngine>> {
        Ok(self.store.read().await.authorization_engines.get(id).cloned())
    }

    async fn create(
        &self,
        domain: &str,
        input: NewAuthorizationEngine,
        principal: &AuthUser,
    ) -> Result<AuthorizationEngine> {
        input.validate()?;

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }
        let duplicate = data
            .authorization_engines
            .values()
            .any(|e| e.domain == domain && e.engine_type == input.engine_type);
        if duplicate {
            return Err(AppError::BadRequest(format!(
                "An authorization engine of type [{}] already exists for this domain",
                input.engine_type
            )));
        }

        let now = Utc::now();
        let engine = AuthorizationEngine {
            id: new_id(),
            name: input.name,
            engine_type: input.engine_type,
            configuration: input.configuration,
            domain: domain.to_string(),
            created_at: now,
            updated_at: now,
        };
        data.authorization_engines
            .insert(engine.id.clone(), engine.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::AUTHORIZATION_ENGINE_CREATED,
            principal,
            audit_target(&engine),
        );

        tracing::info!(domain_id = %domain, authorization_engine_id = %engine.id, "Authorization engine created");
        Ok(engine)
    }

    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateAuthorizationEngine,
        principal: &AuthUser,
    ) -> Result<AuthorizationEngine> {
        input.validate()?;

        let mut data = self.store.write().await;
        let engine = data
            .authorization_engines
            .get_mut(id)
            .filter(|e| e.domain == domain)
            .ok_or_else(|| not_found("Authorization engine", id))?;

        engine.name = input.name;
        engine.configuration = input.configuration;
        engine.updated_at = Utc::now();
        let engine = engine.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::AUTHORIZATION_ENGINE_UPDATED,
            principal,
            audit_target(&engine),
        );
        Ok(engine)
    }

    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let engine = data
            .authorization_engines
            .get(id)
            .filter(|e| e.domain == domain)
            .cloned()
            .ok_or_else(|| not_found("Authorization engine", id))?;

        data.authorization_engines.remove(id);
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::AUTHORIZATION_ENGINE_DELETED,
            principal,
            audit_target(&engine),
        );

        tracing::info!(domain_id = %domain, authorization_engine_id = %id, "Authorization engine deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::MemoryDomainService;
    use super::*;
    use crate::domain::NewDomain;
    use crate::service::DomainService;

    async fn setup() -> (MemoryAuthorizationEngineService, String) {
        let store = store();
        let domain = MemoryDomainService::new(store.clone())
            .create(
                "DEFAULT",
                "DEFAULT",
                NewDomain {
                    name: "Engines".to_string(),
                    description: None,
                },
                &admin(),
            )
            .await
            .unwrap();
        (MemoryAuthorizationEngineService::new(store), domain.id)
    }

    fn openfga() -> NewAuthorizationEngine {
        NewAuthorizationEngine {
            name: "FGA".to_string(),
            engine_type: "openfga".to_string(),
            configuration: serde_json::json!({"storeId": "store-1"}),
        }
    }

    #[tokio::test]
    async fn test_one_engine_per_type() {
        let (service, domain) = setup().await;
        service.create(&domain, openfga(), &admin()).await.unwrap();
        let err = service.create(&domain, openfga(), &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_check_domain() {
        let (service, domain) = setup().await;
        let engine = service.create(&domain, openfga(), &admin()).await.unwrap();

        let input = UpdateAuthorizationEngine {
            name: "OpenFGA".to_string(),
            configuration: serde_json::json!({"storeId": "store-2"}),
        };
        assert!(matches!(
            service.update("other", &engine.id, input.clone(), &admin()).await,
            Err(AppError::NotFound(_))
        ));
        let updated = service
            .update(&domain, &engine.id, input, &admin())
            .await
            .unwrap();
        assert_eq!(updated.configuration["storeId"], "store-2");

        service.delete(&domain, &engine.id, &admin()).await.unwrap();
        assert!(service.find_by_id(&engine.id).await.unwrap().is_none());
    }
}
