//! In-memory identity provider service

use super::{not_found, MemoryStore};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::{
    new_id, IdentityProvider, NewIdentityProvider, ReferenceType, UpdateIdentityProvider,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::IdentityProviderService;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

/// Provider types whose plugin can create and manage users
const USER_PROVIDER_TYPES: &[&str] = &["mongo-am-idp", "jdbc-am-idp", "ldap-am-idp", "http-am-idp"];

fn audit_target(provider: &IdentityProvider) -> AuditEntity {
    AuditEntity {
        id: provider.id.clone(),
        entity_type: "IDENTITY_PROVIDER".to_string(),
        display_name: Some(provider.name.clone()),
    }
}

pub struct MemoryIdentityProviderService {
    store: Arc<MemoryStore>,
}

impl MemoryIdentityProviderService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityProviderService for MemoryIdentityProviderService {
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityProvider>> {
        Ok(self.store.read().await.identity_providers.get(id).cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Vec<IdentityProvider>> {
        let data = self.store.read().await;
        let mut providers: Vec<IdentityProvider> = data
            .identity_providers
            .values()
            .filter(|p| p.domain == domain)
            .cloned()
            .collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(providers)
    }

    async fn create(
        &self,
        domain: &str,
        input: NewIdentityProvider,
        principal: &AuthUser,
    ) -> Result<IdentityProvider> {
        input.validate()?;

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }
        let id = input.id.unwrap_or_else(new_id);
        if data.identity_providers.contains_key(&id) {
            return Err(AppError::Conflict(format!(
                "Identity provider [{}] already exists",
                id
            )));
        }

        let now = Utc::now();
        let provider = IdentityProvider {
            id,
            name: input.name,
            provider_type: input.provider_type,
            configuration: input.configuration,
            mappers: HashMap::new(),
            role_mapper: HashMap::new(),
            domain_whitelist: input.domain_whitelist.unwrap_or_default(),
            domain: domain.to_string(),
            system: false,
            external: input.external,
            created_at: now,
            updated_at: now,
        };
        data.identity_providers
            .insert(provider.id.clone(), provider.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::IDENTITY_PROVIDER_CREATED,
            principal,
            audit_target(&provider),
        );

        tracing::info!(domain_id = %domain, identity_provider_id = %provider.id, "Identity provider created");
        Ok(provider)
    }

    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateIdentityProvider,
        principal: &AuthUser,
    ) -> Result<IdentityProvider> {
        input.validate()?;

        let mut data = self.store.write().await;
        let provider = data
            .identity_providers
            .get_mut(id)
            .filter(|p| p.domain == domain)
            .ok_or_else(|| not_found("Identity provider", id))?;

        provider.name = input.name;
        provider.configuration = input.configuration;
        if let Some(mappers) = input.mappers {
            provider.mappers = mappers;
        }
        if let Some(role_mapper) = input.role_mapper {
            provider.role_mapper = role_mapper;
        }
        if let Some(domain_whitelist) = input.domain_whitelist {
            provider.domain_whitelist = domain_whitelist;
        }
        provider.updated_at = Utc::now();
        let provider = provider.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::IDENTITY_PROVIDER_UPDATED,
            principal,
            audit_target(&provider),
        );
        Ok(provider)
    }

    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let provider = data
            .identity_providers
            .get(id)
            .filter(|p| p.domain == domain)
            .cloned()
            .ok_or_else(|| not_found("Identity provider", id))?;

        if provider.system {
            return Err(AppError::BadRequest(format!(
                "Identity provider [{}] is a system provider and cannot be deleted",
                id
            )));
        }
        let in_use = data
            .applications
            .values()
            .any(|a| a.identity_providers.iter().any(|idp| idp == id));
        if in_use {
            return Err(AppError::BadRequest(format!(
                "Identity provider [{}] is used by one or more applications",
                id
            )));
        }

        data.identity_providers.remove(id);
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::IDENTITY_PROVIDER_DELETED,
            principal,
            audit_target(&provider),
        );

        tracing::info!(domain_id = %domain, identity_provider_id = %id, "Identity provider deleted");
        Ok(())
    }

    fn is_user_provider(&self, provider_type: &str) -> bool {
        USER_PROVIDER_TYPES.contains(&provider_type)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::MemoryDomainService;
    use super::*;
    use crate::domain::NewDomain;
    use crate::service::DomainService;

    async fn setup() -> (MemoryIdentityProviderService, String) {
        let store = store();
        let domain = MemoryDomainService::new(store.clone())
            .create(
                "DEFAULT",
                "DEFAULT",
                NewDomain {
                    name: "Idps".to_string(),
                    description: None,
                },
                &admin(),
            )
            .await
            .unwrap();
        (MemoryIdentityProviderService::new(store), domain.id)
    }

    fn new_provider(id: Option<&str>) -> NewIdentityProvider {
        NewIdentityProvider {
            id: id.map(str::to_string),
            provider_type: "ldap-am-idp".to_string(),
            name: "LDAP".to_string(),
            configuration: serde_json::json!({"url": "ldap://localhost"}),
            domain_whitelist: None,
            external: false,
        }
    }

    #[tokio::test]
    async fn test_create_with_explicit_id_and_duplicate() {
        let (service, domain) = setup().await;
        let created = service
            .create(&domain, new_provider(Some("corp-ldap")), &admin())
            .await
            .unwrap();
        assert_eq!(created.id, "corp-ldap");

        let err = service
            .create(&domain, new_provider(Some("corp-ldap")), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_system_provider_cannot_be_deleted() {
        let (service, domain) = setup().await;
        let default_id = format!("default-idp-{}", domain);
        let err = service
            .delete(&domain, &default_id, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let created = service
            .create(&domain, new_provider(None), &admin())
            .await
            .unwrap();
        service.delete(&domain, &created.id, &admin()).await.unwrap();
        assert!(service.find_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_mappers() {
        let (service, domain) = setup().await;
        let created = service
            .create(&domain, new_provider(None), &admin())
            .await
            .unwrap();
        let updated = service
            .update(
                &domain,
                &created.id,
                UpdateIdentityProvider {
                    name: "Corporate LDAP".to_string(),
                    configuration: serde_json::json!({}),
                    mappers: Some(HashMap::from([("email".to_string(), "mail".to_string())])),
                    role_mapper: None,
                    domain_whitelist: Some(vec!["example.com".to_string()]),
                },
                &admin(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Corporate LDAP");
        assert_eq!(updated.mappers["email"], "mail");
        assert_eq!(updated.domain_whitelist, vec!["example.com"]);
    }

    #[test]
    fn test_is_user_provider() {
        let service = MemoryIdentityProviderService::new(store());
        assert!(service.is_user_provider("mongo-am-idp"));
        assert!(!service.is_user_provider("oauth2-generic-am-idp"));
    }
}
