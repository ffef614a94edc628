//! Extension point policy models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Point of the authentication flow a policy is attached to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionPoint {
    Root,
    PreLogin,
    PostLogin,
    PreConsent,
    PostConsent,
    PreRegister,
    PostRegister,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub extension_point: ExtensionPoint,
    pub enabled: bool,
    pub order: i32,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPolicy {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub policy_type: String,
    pub extension_point: ExtensionPoint,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Appended after the last policy of the extension point when absent
    pub order: Option<i32>,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePolicy {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub enabled: bool,
    pub order: Option<i32>,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

/// One entry of a bulk policy update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyReorder {
    pub id: String,
    pub enabled: Option<bool>,
    pub order: Option<i32>,
    pub extension_point: Option<ExtensionPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_extension_point_as_map_key() {
        let mut map: BTreeMap<ExtensionPoint, Vec<String>> = BTreeMap::new();
        map.insert(ExtensionPoint::PostLogin, vec![]);
        map.insert(ExtensionPoint::PreLogin, vec!["p1".to_string()]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["PRE_LOGIN"][0], "p1");
        assert!(json.get("POST_LOGIN").is_some());
    }

    #[test]
    fn test_new_policy_defaults() {
        let input: NewPolicy = serde_json::from_str(
            r#"{"name": "geo", "type": "geoip", "extensionPoint": "PRE_CONSENT", "configuration": {}}"#,
        )
        .unwrap();
        assert!(input.enabled);
        assert!(input.order.is_none());
        assert_eq!(input.extension_point, ExtensionPoint::PreConsent);
    }
}
