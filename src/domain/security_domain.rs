//! Security domain models

use super::common::ReferenceType;
use super::permission::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;
use validator::Validate;

/// Virtual host a domain answers on when `vhost_mode` is enabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    pub host: String,
    #[serde(default = "default_vhost_path")]
    pub path: String,
    #[serde(default)]
    pub override_entrypoint: bool,
}

fn default_vhost_path() -> String {
    "/".to_string()
}

/// Security domain
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    /// Human readable id, unique per environment
    pub hrid: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub path: String,
    pub vhost_mode: bool,
    pub vhosts: Vec<VirtualHost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub oidc: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub scim: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub uma: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub login_settings: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub account_settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub fn belongs_to_environment(&self, environment_id: &str) -> bool {
        self.reference_type == ReferenceType::Environment && self.reference_id == environment_id
    }

    /// Drop the settings blocks for callers without DOMAIN_SETTINGS[READ]
    pub fn strip_settings(&mut self) {
        self.oidc = None;
        self.scim = None;
        self.uma = None;
        self.login_settings = None;
        self.account_settings = None;
    }
}

/// Input for creating a domain
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDomain {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

/// Partial update of a domain; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchDomain {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub path: Option<String>,
    pub vhost_mode: Option<bool>,
    pub vhosts: Option<Vec<VirtualHost>>,
    #[schema(value_type = Object)]
    pub login_settings: Option<serde_json::Value>,
    #[schema(value_type = Object)]
    pub account_settings: Option<serde_json::Value>,
    #[schema(value_type = Object)]
    pub oidc: Option<serde_json::Value>,
    #[schema(value_type = Object)]
    pub scim: Option<serde_json::Value>,
    #[schema(value_type = Object)]
    pub uma: Option<serde_json::Value>,
}

impl PatchDomain {
    /// Permissions the caller needs UPDATE on to apply this patch
    pub fn required_permissions(&self) -> BTreeSet<Permission> {
        let mut required = BTreeSet::new();

        if self.name.is_some()
            || self.description.is_some()
            || self.enabled.is_some()
            || self.path.is_some()
            || self.vhost_mode.is_some()
            || self.vhosts.is_some()
            || self.login_settings.is_some()
            || self.account_settings.is_some()
        {
            required.insert(Permission::DomainSettings);
        }
        if self.oidc.is_some() {
            required.insert(Permission::DomainOpenid);
        }
        if self.scim.is_some() {
            required.insert(Permission::DomainScim);
        }
        if self.uma.is_some() {
            required.insert(Permission::DomainUma);
        }

        required
    }

    pub fn apply(self, domain: &mut Domain) {
        if let Some(name) = self.name {
            domain.name = name;
        }
        if let Some(description) = self.description {
            domain.description = Some(description);
        }
        if let Some(enabled) = self.enabled {
            domain.enabled = enabled;
        }
        if let Some(path) = self.path {
            domain.path = path;
        }
        if let Some(vhost_mode) = self.vhost_mode {
            domain.vhost_mode = vhost_mode;
        }
        if let Some(vhosts) = self.vhosts {
            domain.vhosts = vhosts;
        }
        if self.login_settings.is_some() {
            domain.login_settings = self.login_settings;
        }
        if self.account_settings.is_some() {
            domain.account_settings = self.account_settings;
        }
        if self.oidc.is_some() {
            domain.oidc = self.oidc;
        }
        if self.scim.is_some() {
            domain.scim = self.scim;
        }
        if self.uma.is_some() {
            domain.uma = self.uma;
        }
    }
}

/// Gateway URL a domain can be reached on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entrypoint {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_domain() -> Domain {
        let now = Utc::now();
        Domain {
            id: "dom-1".to_string(),
            hrid: "my-domain".to_string(),
            name: "My Domain".to_string(),
            description: None,
            enabled: false,
            reference_type: ReferenceType::Environment,
            reference_id: "env-1".to_string(),
            path: "/my-domain".to_string(),
            vhost_mode: false,
            vhosts: vec![],
            oidc: Some(serde_json::json!({"clientRegistrationSettings": {}})),
            scim: Some(serde_json::json!({"enabled": true})),
            uma: None,
            login_settings: Some(serde_json::json!({"inherited": true})),
            account_settings: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_belongs_to_environment() {
        let domain = sample_domain();
        assert!(domain.belongs_to_environment("env-1"));
        assert!(!domain.belongs_to_environment("env-2"));

        let mut other = sample_domain();
        other.reference_type = ReferenceType::Organization;
        assert!(!other.belongs_to_environment("env-1"));
    }

    #[test]
    fn test_strip_settings_removes_blocks_from_json() {
        let mut domain = sample_domain();
        domain.strip_settings();
        let json = serde_json::to_value(&domain).unwrap();
        assert!(json.get("oidc").is_none());
        assert!(json.get("scim").is_none());
        assert!(json.get("loginSettings").is_none());
        assert_eq!(json["hrid"], "my-domain");
        assert_eq!(json["referenceType"], "ENVIRONMENT");
    }

    #[test]
    fn test_required_permissions_for_settings_fields() {
        let patch = PatchDomain {
            name: Some("Renamed".to_string()),
            enabled: Some(true),
            ..Default::default()
        };
        let required: Vec<_> = patch.required_permissions().into_iter().collect();
        assert_eq!(required, vec![Permission::DomainSettings]);
    }

    #[test]
    fn test_required_permissions_for_protocol_blocks() {
        let patch = PatchDomain {
            oidc: Some(serde_json::json!({})),
            uma: Some(serde_json::json!({"enabled": true})),
            ..Default::default()
        };
        let required = patch.required_permissions();
        assert!(required.contains(&Permission::DomainOpenid));
        assert!(required.contains(&Permission::DomainUma));
        assert!(!required.contains(&Permission::DomainSettings));
    }

    #[test]
    fn test_empty_patch_requires_nothing() {
        assert!(PatchDomain::default().required_permissions().is_empty());
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut domain = sample_domain();
        let patch: PatchDomain =
            serde_json::from_str(r#"{"description": "new", "vhostMode": false}"#).unwrap();
        patch.apply(&mut domain);

        assert_eq!(domain.description.as_deref(), Some("new"));
        assert_eq!(domain.name, "My Domain");
        assert!(domain.oidc.is_some());
    }
}
