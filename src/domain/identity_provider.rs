//! Identity provider models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

/// Provider type created alongside every new domain
pub const DEFAULT_IDP_TYPE: &str = "mongo-am-idp";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    pub mappers: HashMap<String, String>,
    pub role_mapper: HashMap<String, Vec<String>>,
    pub domain_whitelist: Vec<String>,
    pub domain: String,
    /// Created by the platform, cannot be deleted
    pub system: bool,
    pub external: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewIdentityProvider {
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub provider_type: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    pub domain_whitelist: Option<Vec<String>>,
    #[serde(default)]
    pub external: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIdentityProvider {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    pub mappers: Option<HashMap<String, String>>,
    pub role_mapper: Option<HashMap<String, Vec<String>>>,
    pub domain_whitelist: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_new_identity_provider_validation() {
        let input: NewIdentityProvider = serde_json::from_str(
            r#"{"type": "ldap-am-idp", "name": "Corporate LDAP", "configuration": {}}"#,
        )
        .unwrap();
        assert!(input.validate().is_ok());
        assert!(input.id.is_none());
        assert!(!input.external);

        let invalid: NewIdentityProvider =
            serde_json::from_str(r#"{"type": "", "name": "", "configuration": {}}"#).unwrap();
        assert!(invalid.validate().is_err());
    }
}
