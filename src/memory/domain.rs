//! In-memory security domain service

use super::certificate::system_certificate;
use super::{not_found, MemoryStore, StoreData};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::identity_provider::DEFAULT_IDP_TYPE;
use crate::domain::role::DOMAIN_PRIMARY_OWNER;
use crate::domain::{
    new_id, slugify, Domain, IdentityProvider, NewDomain, PatchDomain, ReferenceType,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::DomainService;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

pub struct MemoryDomainService {
    store: Arc<MemoryStore>,
}

impl MemoryDomainService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

fn audit_target(domain: &Domain) -> AuditEntity {
    AuditEntity {
        id: domain.id.clone(),
        entity_type: "DOMAIN".to_string(),
        display_name: Some(domain.name.clone()),
    }
}

fn check_path(data: &StoreData, domain_id: &str, environment_id: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(AppError::BadRequest(format!(
            "Domain path [{}] must start with '/'",
            path
        )));
    }
    let taken = data.domains.values().any(|d| {
        d.id != domain_id && d.belongs_to_environment(environment_id) && d.path == path
    });
    if taken {
        return Err(AppError::BadRequest(format!(
            "Domain path [{}] is already in use",
            path
        )));
    }
    Ok(())
}

#[async_trait]
impl DomainService for MemoryDomainService {
    async fn find_by_id(&self, id: &str) -> Result<Option<Domain>> {
        Ok(self.store.read().await.domains.get(id).cloned())
    }

    async fn find_by_hrid(&self, environment_id: &str, hrid: &str) -> Result<Option<Domain>> {
        let data = self.store.read().await;
        Ok(data
            .domains
            .values()
            .find(|d| d.belongs_to_environment(environment_id) && d.hrid == hrid)
            .cloned())
    }

    async fn find_all_by_environment(&self, environment_id: &str) -> Result<Vec<Domain>> {
        let data = self.store.read().await;
        let mut domains: Vec<Domain> = data
            .domains
            .values()
            .filter(|d| d.belongs_to_environment(environment_id))
            .cloned()
            .collect();
        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(domains)
    }

    async fn create(
        &self,
        organization_id: &str,
        environment_id: &str,
        input: NewDomain,
        principal: &AuthUser,
    ) -> Result<Domain> {
        input.validate()?;

        let hrid = slugify(&input.name);
        if hrid.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Domain name [{}] does not contain any usable character",
                input.name
            )));
        }

        let mut data = self.store.write().await;
        let duplicate = data
            .domains
            .values()
            .any(|d| d.belongs_to_environment(environment_id) && d.hrid == hrid);
        if duplicate {
            return Err(AppError::Conflict(format!(
                "Domain with hrid [{}] already exists",
                hrid
            )));
        }

        let now = Utc::now();
        let domain = Domain {
            id: new_id(),
            path: format!("/{}", hrid),
            hrid,
            name: input.name,
            description: input.description,
            enabled: false,
            reference_type: ReferenceType::Environment,
            reference_id: environment_id.to_string(),
            vhost_mode: false,
            vhosts: vec![],
            oidc: Some(serde_json::json!({})),
            scim: None,
            uma: None,
            login_settings: None,
            account_settings: None,
            created_at: now,
            updated_at: now,
        };
        check_path(&data, &domain.id, environment_id, &domain.path)?;

        let idp = IdentityProvider {
            id: format!("default-idp-{}", domain.id),
            name: "Default Identity Provider".to_string(),
            provider_type: DEFAULT_IDP_TYPE.to_string(),
            configuration: serde_json::json!({}),
            mappers: HashMap::new(),
            role_mapper: HashMap::new(),
            domain_whitelist: vec![],
            domain: domain.id.clone(),
            system: true,
            external: false,
            created_at: now,
            updated_at: now,
        };
        let certificate = system_certificate(&domain.id, "Default");

        data.identity_providers.insert(idp.id.clone(), idp);
        data.certificates
            .insert(certificate.id.clone(), certificate);
        data.grant(
            &principal.user_id,
            ReferenceType::Domain,
            &domain.id,
            DOMAIN_PRIMARY_OWNER,
        );
        data.domains.insert(domain.id.clone(), domain.clone());
        data.record(
            ReferenceType::Domain,
            &domain.id,
            event_type::DOMAIN_CREATED,
            principal,
            audit_target(&domain),
        );

        tracing::info!(
            organization_id = %organization_id,
            environment_id = %environment_id,
            domain_id = %domain.id,
            hrid = %domain.hrid,
            "Domain created"
        );
        Ok(domain)
    }

    async fn patch(&self, id: &str, input: PatchDomain, principal: &AuthUser) -> Result<Domain> {
        input.validate()?;

        let mut data = self.store.write().await;
        let mut domain = data
            .domains
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Domain", id))?;

        if let Some(path) = &input.path {
            check_path(&data, id, &domain.reference_id, path)?;
        }
        input.apply(&mut domain);

        if domain.vhost_mode && domain.vhosts.is_empty() {
            return Err(AppError::BadRequest(
                "At least one virtual host is required when vhost mode is enabled".to_string(),
            ));
        }
        if domain.vhosts.iter().any(|v| v.host.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Virtual host must not be empty".to_string(),
            ));
        }

        domain.updated_at = Utc::now();
        data.domains.insert(domain.id.clone(), domain.clone());
        data.record(
            ReferenceType::Domain,
            &domain.id,
            event_type::DOMAIN_UPDATED,
            principal,
            audit_target(&domain),
        );

        tracing::info!(domain_id = %domain.id, "Domain updated");
        Ok(domain)
    }

    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let domain = data
            .domains
            .remove(id)
            .ok_or_else(|| not_found("Domain", id))?;

        let application_ids: Vec<String> = data
            .applications
            .values()
            .filter(|a| a.domain == id)
            .map(|a| a.id.clone())
            .collect();
        for application_id in &application_ids {
            data.applications.remove(application_id);
            data.remove_memberships_on(ReferenceType::Application, application_id);
        }
        data.certificates.retain(|_, c| c.domain != id);
        data.identity_providers.retain(|_, i| i.domain != id);
        data.users.retain(|_, u| u.domain != id);
        data.policies.retain(|_, p| p.domain != id);
        data.password_policies.retain(|_, p| p.domain != id);
        data.authorization_engines.retain(|_, e| e.domain != id);
        data.remove_memberships_on(ReferenceType::Domain, id);
        data.audits
            .retain(|a| !(a.reference_type == ReferenceType::Domain && a.reference_id == id));

        data.record(
            ReferenceType::Environment,
            &domain.reference_id,
            event_type::DOMAIN_DELETED,
            principal,
            audit_target(&domain),
        );

        tracing::info!(
            domain_id = %id,
            applications = application_ids.len(),
            "Domain deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::VirtualHost;

    fn new_domain(name: &str) -> NewDomain {
        NewDomain {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_domain_with_defaults() {
        let store = store();
        let service = MemoryDomainService::new(store.clone());

        let domain = service
            .create("DEFAULT", "DEFAULT", new_domain("My Domain"), &admin())
            .await
            .unwrap();

        assert_eq!(domain.hrid, "my-domain");
        assert_eq!(domain.path, "/my-domain");
        assert!(domain.belongs_to_environment("DEFAULT"));

        let data = store.read().await;
        let idp = &data.identity_providers[&format!("default-idp-{}", domain.id)];
        assert!(idp.system);
        assert_eq!(idp.provider_type, DEFAULT_IDP_TYPE);
        assert_eq!(
            data.certificates.values().filter(|c| c.domain == domain.id).count(),
            1
        );
        let owner = data
            .memberships
            .values()
            .find(|m| m.is_on(ReferenceType::Domain, &domain.id))
            .unwrap();
        assert_eq!(owner.role, DOMAIN_PRIMARY_OWNER);
        assert_eq!(owner.member_id, "admin");
        assert!(data
            .audits
            .iter()
            .any(|a| a.event_type == event_type::DOMAIN_CREATED));
    }

    #[tokio::test]
    async fn test_create_duplicate_hrid_conflicts() {
        let service = MemoryDomainService::new(store());
        service
            .create("DEFAULT", "DEFAULT", new_domain("Acme"), &admin())
            .await
            .unwrap();

        let err = service
            .create("DEFAULT", "DEFAULT", new_domain("ACME"), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // same hrid is fine in another environment
        assert!(service
            .create("DEFAULT", "OTHER", new_domain("Acme"), &admin())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let service = MemoryDomainService::new(store());
        let err = service
            .create("DEFAULT", "DEFAULT", new_domain(""), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_patch_rules() {
        let service = MemoryDomainService::new(store());
        let a = service
            .create("DEFAULT", "DEFAULT", new_domain("Alpha"), &admin())
            .await
            .unwrap();
        service
            .create("DEFAULT", "DEFAULT", new_domain("Beta"), &admin())
            .await
            .unwrap();

        let bad_path = PatchDomain {
            path: Some("no-slash".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.patch(&a.id, bad_path, &admin()).await,
            Err(AppError::BadRequest(_))
        ));

        let taken = PatchDomain {
            path: Some("/beta".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.patch(&a.id, taken, &admin()).await,
            Err(AppError::BadRequest(_))
        ));

        let vhost_without_hosts = PatchDomain {
            vhost_mode: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            service.patch(&a.id, vhost_without_hosts, &admin()).await,
            Err(AppError::BadRequest(_))
        ));

        let ok = PatchDomain {
            vhost_mode: Some(true),
            vhosts: Some(vec![VirtualHost {
                host: "alpha.example.com".to_string(),
                path: "/".to_string(),
                override_entrypoint: true,
            }]),
            enabled: Some(true),
            ..Default::default()
        };
        let patched = service.patch(&a.id, ok, &admin()).await.unwrap();
        assert!(patched.enabled);
        assert!(patched.vhost_mode);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = store();
        let service = MemoryDomainService::new(store.clone());
        let domain = service
            .create("DEFAULT", "DEFAULT", new_domain("Doomed"), &admin())
            .await
            .unwrap();

        service.delete(&domain.id, &admin()).await.unwrap();

        let data = store.read().await;
        assert!(data.domains.is_empty());
        assert!(data.identity_providers.is_empty());
        assert!(data.certificates.is_empty());
        assert!(!data
            .memberships
            .values()
            .any(|m| m.is_on(ReferenceType::Domain, &domain.id)));
        assert!(data
            .audits
            .iter()
            .any(|a| a.event_type == event_type::DOMAIN_DELETED));

        drop(data);
        assert!(matches!(
            service.delete(&domain.id, &admin()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
