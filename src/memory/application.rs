//! In-memory application service

use super::{not_found, MemoryStore, StoreData};
use crate::crypto::generate_client_secret;
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::role::APPLICATION_PRIMARY_OWNER;
use crate::domain::{
    new_id, Application, ApplicationAdvancedSettings, ApplicationOAuthSettings,
    ApplicationSettings, ApplicationType, NewApplication, PatchApplication, ReferenceType,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::ApplicationService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn audit_target(application: &Application) -> AuditEntity {
    AuditEntity {
        id: application.id.clone(),
        entity_type: "APPLICATION".to_string(),
        display_name: Some(application.name.clone()),
    }
}

/// Redirect URIs must be absolute URLs
fn check_redirect_uris(redirect_uris: &[String]) -> Result<()> {
    for uri in redirect_uris {
        url::Url::parse(uri)
            .map_err(|_| AppError::BadRequest(format!("redirect_uri [{}] is malformed", uri)))?;
    }
    Ok(())
}

fn check_references(data: &StoreData, domain: &str, application: &Application) -> Result<()> {
    for idp in &application.identity_providers {
        let known = data
            .identity_providers
            .get(idp)
            .is_some_and(|p| p.domain == domain);
        if !known {
            return Err(AppError::BadRequest(format!(
                "Identity provider [{}] does not exist in domain",
                idp
            )));
        }
    }
    if let Some(certificate) = &application.certificate {
        let known = data
            .certificates
            .get(certificate)
            .is_some_and(|c| c.domain == domain);
        if !known {
            return Err(AppError::BadRequest(format!(
                "Certificate [{}] does not exist in domain",
                certificate
            )));
        }
    }
    Ok(())
}

fn client_id_taken(data: &StoreData, domain: &str, client_id: &str, except: Option<&str>) -> bool {
    data.applications.values().any(|a| {
        a.domain == domain && a.client_id() == Some(client_id) && Some(a.id.as_str()) != except
    })
}

pub struct MemoryApplicationService {
    store: Arc<MemoryStore>,
}

impl MemoryApplicationService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ApplicationService for MemoryApplicationService {
    async fn find_by_id(&self, id: &str) -> Result<Option<Application>> {
        Ok(self.store.read().await.applications.get(id).cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Vec<Application>> {
        let data = self.store.read().await;
        let mut applications: Vec<Application> = data
            .applications
            .values()
            .filter(|a| a.domain == domain)
            .cloned()
            .collect();
        applications.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(applications)
    }

    async fn create(
        &self,
        domain: &str,
        input: NewApplication,
        principal: &AuthUser,
    ) -> Result<Application> {
        input.validate()?;
        let redirect_uris = input.redirect_uris.unwrap_or_default();
        check_redirect_uris(&redirect_uris)?;

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }

        let client_id = input.client_id.unwrap_or_else(new_id);
        if client_id_taken(&data, domain, &client_id, None) {
            return Err(AppError::Conflict(format!(
                "Application with client_id [{}] already exists",
                client_id
            )));
        }

        let client_secret = if input.app_type.is_public() {
            None
        } else {
            Some(input.client_secret.unwrap_or_else(generate_client_secret))
        };

        let now = Utc::now();
        let application = Application {
            id: new_id(),
            name: input.name,
            app_type: input.app_type,
            description: input.description,
            domain: domain.to_string(),
            enabled: true,
            template: false,
            identity_providers: vec![],
            certificate: None,
            factors: vec![],
            settings: Some(ApplicationSettings {
                oauth: Some(ApplicationOAuthSettings {
                    client_id,
                    client_secret,
                    redirect_uris,
                    grant_types: input.app_type.default_grant_types(),
                    scopes: vec!["openid".to_string()],
                    token_endpoint_auth_method: input
                        .app_type
                        .token_endpoint_auth_method()
                        .to_string(),
                }),
                advanced: Some(ApplicationAdvancedSettings {
                    skip_consent: false,
                    flows_inherited: true,
                }),
            }),
            created_at: now,
            updated_at: now,
        };
        data.applications
            .insert(application.id.clone(), application.clone());
        data.grant(
            &principal.user_id,
            ReferenceType::Application,
            &application.id,
            APPLICATION_PRIMARY_OWNER,
        );
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::APPLICATION_CREATED,
            principal,
            audit_target(&application),
        );

        tracing::info!(domain_id = %domain, application_id = %application.id, "Application created");
        Ok(application)
    }

    async fn patch(
        &self,
        domain: &str,
        id: &str,
        input: PatchApplication,
        principal: &AuthUser,
    ) -> Result<Application> {
        input.validate()?;
        if let Some(redirect_uris) = input.redirect_uris() {
            check_redirect_uris(redirect_uris)?;
        }

        let mut data = self.store.write().await;
        let mut application = data
            .applications
            .get(id)
            .filter(|a| a.domain == domain)
            .cloned()
            .ok_or_else(|| not_found("Application", id))?;

        input.apply(&mut application);
        check_references(&data, domain, &application)?;
        application.updated_at = Utc::now();

        data.applications
            .insert(application.id.clone(), application.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::APPLICATION_UPDATED,
            principal,
            audit_target(&application),
        );
        Ok(application)
    }

    async fn update_type(
        &self,
        domain: &str,
        id: &str,
        app_type: ApplicationType,
        principal: &AuthUser,
    ) -> Result<Application> {
        let mut data = self.store.write().await;
        let application = data
            .applications
            .get_mut(id)
            .filter(|a| a.domain == domain)
            .ok_or_else(|| not_found("Application", id))?;

        application.app_type = app_type;
        if let Some(oauth) = application
            .settings
            .get_or_insert_with(Default::default)
            .oauth
            .as_mut()
        {
            oauth.grant_types = app_type.default_grant_types();
            oauth.token_endpoint_auth_method = app_type.token_endpoint_auth_method().to_string();
            if app_type.is_public() {
                oauth.client_secret = None;
            } else if oauth.client_secret.is_none() {
                oauth.client_secret = Some(generate_client_secret());
            }
        }
        application.updated_at = Utc::now();
        let application = application.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::APPLICATION_UPDATED,
            principal,
            audit_target(&application),
        );
        Ok(application)
    }

    async fn renew_client_secret(
        &self,
        domain: &str,
        id: &str,
        principal: &AuthUser,
    ) -> Result<Application> {
        let mut data = self.store.write().await;
        let application = data
            .applications
            .get_mut(id)
            .filter(|a| a.domain == domain)
            .ok_or_else(|| not_found("Application", id))?;

        if application.app_type.is_public() {
            return Err(AppError::BadRequest(format!(
                "Application [{}] is a public client and has no secret",
                id
            )));
        }
        let oauth = application
            .settings
            .as_mut()
            .and_then(|s| s.oauth.as_mut())
            .ok_or_else(|| {
                AppError::BadRequest(format!("Application [{}] has no OAuth settings", id))
            })?;
        oauth.client_secret = Some(generate_client_secret());
        application.updated_at = Utc::now();
        let application = application.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::APPLICATION_CLIENT_SECRET_RENEWED,
            principal,
            audit_target(&application),
        );

        tracing::info!(domain_id = %domain, application_id = %id, "Client secret renewed");
        Ok(application)
    }

    async fn delete(&self, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let application = data
            .applications
            .remove(id)
            .ok_or_else(|| not_found("Application", id))?;
        data.remove_memberships_on(ReferenceType::Application, id);
        data.record(
            ReferenceType::Domain,
            &application.domain,
            event_type::APPLICATION_DELETED,
            principal,
            audit_target(&application),
        );

        tracing::info!(application_id = %id, "Application deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::MemoryDomainService;
    use super::*;
    use crate::domain::{NewDomain, PatchApplicationOAuthSettings, PatchApplicationSettings};
    use crate::service::DomainService;

    async fn setup() -> (Arc<MemoryStore>, MemoryApplicationService, String) {
        let store = store();
        let domain = MemoryDomainService::new(store.clone())
            .create(
                "DEFAULT",
                "DEFAULT",
                NewDomain {
                    name: "Apps".to_string(),
                    description: None,
                },
                &admin(),
            )
            .await
            .unwrap();
        (
            store.clone(),
            MemoryApplicationService::new(store),
            domain.id,
        )
    }

    fn new_app(name: &str, app_type: ApplicationType, client_id: Option<&str>) -> NewApplication {
        NewApplication {
            name: name.to_string(),
            app_type,
            description: None,
            client_id: client_id.map(str::to_string),
            client_secret: None,
            redirect_uris: Some(vec!["https://app.example.com/callback".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_create_web_application() {
        let (store, service, domain) = setup().await;
        let app = service
            .create(&domain, new_app("Portal", ApplicationType::Web, None), &principal("alice"))
            .await
            .unwrap();

        let oauth = app.settings.as_ref().unwrap().oauth.as_ref().unwrap();
        assert!(oauth.client_secret.is_some());
        assert_eq!(oauth.grant_types, vec!["authorization_code"]);

        let data = store.read().await;
        assert!(data.memberships.values().any(|m| m.member_id == "alice"
            && m.is_on(ReferenceType::Application, &app.id)
            && m.role == APPLICATION_PRIMARY_OWNER));
    }

    #[tokio::test]
    async fn test_public_client_has_no_secret() {
        let (_, service, domain) = setup().await;
        let app = service
            .create(&domain, new_app("Spa", ApplicationType::Browser, None), &admin())
            .await
            .unwrap();
        let oauth = app.settings.as_ref().unwrap().oauth.as_ref().unwrap();
        assert!(oauth.client_secret.is_none());
        assert_eq!(oauth.token_endpoint_auth_method, "none");

        let err = service
            .renew_client_secret(&domain, &app.id, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_duplicate_client_id_conflicts() {
        let (_, service, domain) = setup().await;
        service
            .create(&domain, new_app("A", ApplicationType::Web, Some("shared")), &admin())
            .await
            .unwrap();
        let err = service
            .create(&domain, new_app("B", ApplicationType::Service, Some("shared")), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_malformed_redirect_uri_rejected() {
        let (_, service, domain) = setup().await;
        let mut input = new_app("Bad", ApplicationType::Web, None);
        input.redirect_uris = Some(vec!["not a url".to_string()]);
        let err = service.create(&domain, input, &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_patch_rejects_unknown_identity_provider() {
        let (_, service, domain) = setup().await;
        let app = service
            .create(&domain, new_app("Portal", ApplicationType::Web, None), &admin())
            .await
            .unwrap();

        let err = service
            .patch(
                &domain,
                &app.id,
                PatchApplication {
                    identity_providers: Some(vec!["unknown".to_string()]),
                    ..Default::default()
                },
                &admin(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let patched = service
            .patch(
                &domain,
                &app.id,
                PatchApplication {
                    identity_providers: Some(vec![format!("default-idp-{}", domain)]),
                    settings: Some(PatchApplicationSettings {
                        oauth: Some(PatchApplicationOAuthSettings {
                            scopes: Some(vec!["openid".to_string(), "email".to_string()]),
                            ..Default::default()
                        }),
                        advanced: None,
                    }),
                    ..Default::default()
                },
                &admin(),
            )
            .await
            .unwrap();
        assert_eq!(patched.identity_providers.len(), 1);
        assert_eq!(
            patched.settings.unwrap().oauth.unwrap().scopes,
            vec!["openid", "email"]
        );
    }

    #[tokio::test]
    async fn test_renew_secret_changes_value() {
        let (_, service, domain) = setup().await;
        let app = service
            .create(&domain, new_app("Backend", ApplicationType::Service, None), &admin())
            .await
            .unwrap();
        let before = app.settings.unwrap().oauth.unwrap().client_secret;
        let renewed = service
            .renew_client_secret(&domain, &app.id, &admin())
            .await
            .unwrap();
        assert_ne!(renewed.settings.unwrap().oauth.unwrap().client_secret, before);
    }

    #[tokio::test]
    async fn test_update_type_to_public_drops_secret() {
        let (_, service, domain) = setup().await;
        let app = service
            .create(&domain, new_app("Portal", ApplicationType::Web, None), &admin())
            .await
            .unwrap();
        let updated = service
            .update_type(&domain, &app.id, ApplicationType::Native, &admin())
            .await
            .unwrap();
        let oauth = updated.settings.unwrap().oauth.unwrap();
        assert!(oauth.client_secret.is_none());
        assert_eq!(updated.app_type, ApplicationType::Native);
    }

    #[tokio::test]
    async fn test_delete_removes_memberships() {
        let (store, service, domain) = setup().await;
        let app = service
            .create(&domain, new_app("Portal", ApplicationType::Web, None), &admin())
            .await
            .unwrap();
        service.delete(&app.id, &admin()).await.unwrap();

        assert!(service.find_by_id(&app.id).await.unwrap().is_none());
        let data = store.read().await;
        assert!(!data
            .memberships
            .values()
            .any(|m| m.is_on(ReferenceType::Application, &app.id)));
    }
}
