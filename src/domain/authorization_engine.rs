//! Authorization engine models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationEngine {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub engine_type: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthorizationEngine {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub engine_type: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthorizationEngine {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}
