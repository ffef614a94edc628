//! Application (OAuth client) models

use super::permission::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationType {
    Web,
    Native,
    Browser,
    Service,
    ResourceServer,
}

impl ApplicationType {
    pub fn default_grant_types(&self) -> Vec<String> {
        match self {
            ApplicationType::Web | ApplicationType::Native | ApplicationType::Browser => {
                vec!["authorization_code".to_string()]
            }
            ApplicationType::Service | ApplicationType::ResourceServer => {
                vec!["client_credentials".to_string()]
            }
        }
    }

    /// Public clients cannot keep a secret
    pub fn is_public(&self) -> bool {
        matches!(self, ApplicationType::Native | ApplicationType::Browser)
    }

    pub fn token_endpoint_auth_method(&self) -> &'static str {
        if self.is_public() {
            "none"
        } else {
            "client_secret_basic"
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOAuthSettings {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub token_endpoint_auth_method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAdvancedSettings {
    #[serde(default)]
    pub skip_consent: bool,
    #[serde(default = "default_true")]
    pub flows_inherited: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSettings {
    pub oauth: Option<ApplicationOAuthSettings>,
    pub advanced: Option<ApplicationAdvancedSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub app_type: ApplicationType,
    pub description: Option<String>,
    pub domain: String,
    pub enabled: bool,
    pub template: bool,
    pub identity_providers: Vec<String>,
    pub certificate: Option<String>,
    pub factors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<ApplicationSettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn client_id(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| s.oauth.as_ref())
            .map(|o| o.client_id.as_str())
    }

    pub fn strip_settings(&mut self) {
        self.settings = None;
    }

    pub fn strip_client_secret(&mut self) {
        if let Some(oauth) = self.settings.as_mut().and_then(|s| s.oauth.as_mut()) {
            oauth.client_secret = None;
        }
    }

    /// Copy the OAuth settings of `source` back in, leaving the other settings untouched
    pub fn restore_oauth(&mut self, source: &Application) {
        if let Some(oauth) = source.settings.as_ref().and_then(|s| s.oauth.clone()) {
            self.settings.get_or_insert_with(Default::default).oauth = Some(oauth);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    pub app_type: ApplicationType,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchApplicationOAuthSettings {
    pub redirect_uris: Option<Vec<String>>,
    pub grant_types: Option<Vec<String>>,
    pub scopes: Option<Vec<String>>,
    pub token_endpoint_auth_method: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchApplicationSettings {
    pub oauth: Option<PatchApplicationOAuthSettings>,
    pub advanced: Option<ApplicationAdvancedSettings>,
}

/// Partial update of an application; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchApplication {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub template: Option<bool>,
    pub identity_providers: Option<Vec<String>>,
    /// Empty string detaches the certificate
    pub certificate: Option<String>,
    pub factors: Option<Vec<String>>,
    pub settings: Option<PatchApplicationSettings>,
}

impl PatchApplication {
    /// Permissions the caller needs UPDATE on to apply this patch
    pub fn required_permissions(&self) -> BTreeSet<Permission> {
        let mut required = BTreeSet::new();

        if self.name.is_some()
            || self.description.is_some()
            || self.enabled.is_some()
            || self.template.is_some()
        {
            required.insert(Permission::ApplicationSettings);
        }
        if let Some(settings) = &self.settings {
            if settings.advanced.is_some() {
                required.insert(Permission::ApplicationSettings);
            }
            if settings.oauth.is_some() {
                required.insert(Permission::ApplicationOpenid);
            }
        }
        if self.identity_providers.is_some() {
            required.insert(Permission::ApplicationIdentityProvider);
        }
        if self.certificate.is_some() {
            required.insert(Permission::ApplicationCertificate);
        }
        if self.factors.is_some() {
            required.insert(Permission::ApplicationFactor);
        }

        required
    }

    pub fn apply(self, application: &mut Application) {
        if let Some(name) = self.name {
            application.name = name;
        }
        if let Some(description) = self.description {
            application.description = Some(description);
        }
        if let Some(enabled) = self.enabled {
            application.enabled = enabled;
        }
        if let Some(template) = self.template {
            application.template = template;
        }
        if let Some(identity_providers) = self.identity_providers {
            application.identity_providers = identity_providers;
        }
        if let Some(certificate) = self.certificate {
            application.certificate = if certificate.is_empty() {
                None
            } else {
                Some(certificate)
            };
        }
        if let Some(factors) = self.factors {
            application.factors = factors;
        }
        if let Some(patch) = self.settings {
            let settings = application.settings.get_or_insert_with(Default::default);
            if let Some(advanced) = patch.advanced {
                settings.advanced = Some(advanced);
            }
            if let Some(oauth_patch) = patch.oauth {
                let oauth = settings.oauth.get_or_insert_with(Default::default);
                if let Some(redirect_uris) = oauth_patch.redirect_uris {
                    oauth.redirect_uris = redirect_uris;
                }
                if let Some(grant_types) = oauth_patch.grant_types {
                    oauth.grant_types = grant_types;
                }
                if let Some(scopes) = oauth_patch.scopes {
                    oauth.scopes = scopes;
                }
                if let Some(method) = oauth_patch.token_endpoint_auth_method {
                    oauth.token_endpoint_auth_method = method;
                }
            }
        }
    }

    /// Redirect URIs carried by this patch, if any
    pub fn redirect_uris(&self) -> Option<&[String]> {
        self.settings
            .as_ref()
            .and_then(|s| s.oauth.as_ref())
            .and_then(|o| o.redirect_uris.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateApplicationType {
    #[serde(rename = "type")]
    pub app_type: ApplicationType,
}
