//! In-memory certificate service

use super::{not_found, MemoryStore};
use crate::crypto::generate_key_material;
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::certificate::USAGE_SIGNATURE;
use crate::domain::{
    new_id, Certificate, CertificateKey, NewCertificate, ReferenceType, UpdateCertificate,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::CertificateService;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::Validate;

const SYSTEM_CERTIFICATE_TYPE: &str = "pkcs12-am-certificate";
const SYSTEM_CERTIFICATE_VALIDITY_DAYS: i64 = 365;

/// Certificate minted by the platform for a domain
pub(super) fn system_certificate(domain: &str, name: &str) -> Certificate {
    let now = Utc::now();
    Certificate {
        id: new_id(),
        name: name.to_string(),
        cert_type: SYSTEM_CERTIFICATE_TYPE.to_string(),
        configuration: serde_json::json!({"algorithm": "SHA256withRSA", "keySize": 2048}),
        domain: domain.to_string(),
        usage: vec![USAGE_SIGNATURE.to_string()],
        system: true,
        expires_at: Some(now + Duration::days(SYSTEM_CERTIFICATE_VALIDITY_DAYS)),
        public_key: generate_key_material(),
        created_at: now,
        updated_at: now,
    }
}

fn audit_target(certificate: &Certificate) -> AuditEntity {
    AuditEntity {
        id: certificate.id.clone(),
        entity_type: "CERTIFICATE".to_string(),
        display_name: Some(certificate.name.clone()),
    }
}

fn check_configuration(configuration: &serde_json::Value) -> Result<()> {
    if configuration.is_object() {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Certificate configuration must be a JSON object".to_string(),
        ))
    }
}

/// Usages declared in the configuration, defaulting to signature
fn usage_from(configuration: &serde_json::Value) -> Vec<String> {
    configuration
        .get("use")
        .and_then(|u| u.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .filter(|values| !values.is_empty())
        .unwrap_or_else(|| vec![USAGE_SIGNATURE.to_string()])
}

pub struct MemoryCertificateService {
    store: Arc<MemoryStore>,
}

impl MemoryCertificateService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CertificateService for MemoryCertificateService {
    async fn find_by_id(&self, id: &str) -> Result<Option<Certificate>> {
        Ok(self.store.read().await.certificates.get(id).cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Vec<Certificate>> {
        let data = self.store.read().await;
        let mut certificates: Vec<Certificate> = data
            .certificates
            .values()
            .filter(|c| c.domain == domain)
            .cloned()
            .collect();
        certificates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(certificates)
    }

    async fn create(
        &self,
        domain: &str,
        input: NewCertificate,
        principal: &AuthUser,
    ) -> Result<Certificate> {
        input.validate()?;
        check_configuration(&input.configuration)?;

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }

        let now = Utc::now();
        let certificate = Certificate {
            id: new_id(),
            name: input.name,
            cert_type: input.cert_type,
            usage: usage_from(&input.configuration),
            configuration: input.configuration,
            domain: domain.to_string(),
            system: false,
            expires_at: None,
            public_key: generate_key_material(),
            created_at: now,
            updated_at: now,
        };
        data.certificates
            .insert(certificate.id.clone(), certificate.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::CERTIFICATE_CREATED,
            principal,
            audit_target(&certificate),
        );

        tracing::info!(domain_id = %domain, certificate_id = %certificate.id, "Certificate created");
        Ok(certificate)
    }

    async fn rotate(&self, domain: &str, principal: &AuthUser) -> Result<Certificate> {
        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }

        let name = format!("Default {}", Utc::now().format("%Y%m%d%H%M%S"));
        let certificate = system_certificate(domain, &name);
        data.certificates
            .insert(certificate.id.clone(), certificate.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::CERTIFICATE_CREATED,
            principal,
            audit_target(&certificate),
        );

        tracing::info!(domain_id = %domain, certificate_id = %certificate.id, "System certificate rotated");
        Ok(certificate)
    }

    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateCertificate,
        principal: &AuthUser,
    ) -> Result<Certificate> {
        input.validate()?;
        check_configuration(&input.configuration)?;

        let mut data = self.store.write().await;
        let certificate = data
            .certificates
            .get_mut(id)
            .filter(|c| c.domain == domain)
            .ok_or_else(|| not_found("Certificate", id))?;

        certificate.name = input.name;
        certificate.usage = usage_from(&input.configuration);
        certificate.configuration = input.configuration;
        certificate.updated_at = Utc::now();
        let certificate = certificate.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::CERTIFICATE_UPDATED,
            principal,
            audit_target(&certificate),
        );
        Ok(certificate)
    }

    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let in_use: Vec<String> = data
            .applications
            .values()
            .filter(|a| a.certificate.as_deref() == Some(id))
            .map(|a| a.name.clone())
            .collect();
        if !in_use.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Certificate [{}] is used by applications: {}",
                id,
                in_use.join(", ")
            )));
        }

        let certificate = data
            .certificates
            .remove(id)
            .ok_or_else(|| not_found("Certificate", id))?;
        data.record(
            ReferenceType::Domain,
            &certificate.domain,
            event_type::CERTIFICATE_DELETED,
            principal,
            audit_target(&certificate),
        );

        tracing::info!(certificate_id = %id, "Certificate deleted");
        Ok(())
    }

    async fn get_public_key(&self, id: &str) -> Result<String> {
        let data = self.store.read().await;
        let certificate = data
            .certificates
            .get(id)
            .ok_or_else(|| not_found("Certificate", id))?;
        Ok(certificate.public_key.clone())
    }

    async fn get_public_keys(&self, id: &str) -> Result<Vec<CertificateKey>> {
        let data = self.store.read().await;
        let certificate = data
            .certificates
            .get(id)
            .ok_or_else(|| not_found("Certificate", id))?;
        Ok(certificate.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::MemoryDomainService;
    use super::*;
    use crate::domain::NewDomain;
    use crate::service::DomainService;

    async fn setup() -> (Arc<MemoryStore>, String) {
        let store = store();
        let domain = MemoryDomainService::new(store.clone())
            .create(
                "DEFAULT",
                "DEFAULT",
                NewDomain {
                    name: "Certs".to_string(),
                    description: None,
                },
                &admin(),
            )
            .await
            .unwrap();
        (store, domain.id)
    }

    #[tokio::test]
    async fn test_create_requires_object_configuration() {
        let (store, domain) = setup().await;
        let service = MemoryCertificateService::new(store);

        let err = service
            .create(
                &domain,
                NewCertificate {
                    name: "bad".to_string(),
                    cert_type: "javakeystore-am-certificate".to_string(),
                    configuration: serde_json::json!("not an object"),
                },
                &admin(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let cert = service
            .create(
                &domain,
                NewCertificate {
                    name: "enc".to_string(),
                    cert_type: "javakeystore-am-certificate".to_string(),
                    configuration: serde_json::json!({"use": ["enc"]}),
                },
                &admin(),
            )
            .await
            .unwrap();
        assert!(cert.has_usage("enc"));
        assert!(!cert.system);
    }

    #[tokio::test]
    async fn test_rotate_adds_system_certificate() {
        let (store, domain) = setup().await;
        let service = MemoryCertificateService::new(store);

        let rotated = service.rotate(&domain, &admin()).await.unwrap();
        assert!(rotated.system);
        assert!(rotated.name.starts_with("Default "));
        assert_eq!(service.find_by_domain(&domain).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_keys() {
        let (store, domain) = setup().await;
        let service = MemoryCertificateService::new(store);
        let cert = service.find_by_domain(&domain).await.unwrap().remove(0);

        let key = service.get_public_key(&cert.id).await.unwrap();
        let keys = service.get_public_keys(&cert.id).await.unwrap();
        assert_eq!(keys[1].payload, key);
        assert!(matches!(
            service.get_public_key("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_checks_domain_ownership() {
        let (store, domain) = setup().await;
        let service = MemoryCertificateService::new(store);
        let cert = service.find_by_domain(&domain).await.unwrap().remove(0);

        let input = UpdateCertificate {
            name: "Renamed".to_string(),
            configuration: serde_json::json!({}),
        };
        assert!(matches!(
            service
                .update("other-domain", &cert.id, input.clone(), &admin())
                .await,
            Err(AppError::NotFound(_))
        ));
        let updated = service
            .update(&domain, &cert.id, input, &admin())
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
    }
}
