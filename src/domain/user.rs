//! Domain user models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Identity provider the user is stored in
    pub source: String,
    /// Application the user registered through
    pub client: Option<String>,
    pub domain: String,
    pub enabled: bool,
    pub account_non_locked: bool,
    pub account_locked_at: Option<DateTime<Utc>>,
    pub pre_registration: bool,
    pub registration_completed: bool,
    #[schema(value_type = Object)]
    pub additional_information: HashMap<String, serde_json::Value>,
    pub last_password_reset: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// Previous hashes, newest first
    #[serde(skip)]
    pub password_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let contains = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| v.to_lowercase().contains(&query))
                .unwrap_or(false)
        };
        self.username.to_lowercase().contains(&query)
            || contains(&self.email)
            || contains(&self.display_name)
    }

    /// Name shown in listings: display name, else "first last", else username
    pub fn computed_display_name(&self) -> String {
        if let Some(display_name) = &self.display_name {
            return display_name.clone();
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    pub password: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub source: Option<String>,
    pub client: Option<String>,
    #[serde(default)]
    pub pre_registration: bool,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub additional_information: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(email)]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub enabled: Option<bool>,
    pub client: Option<String>,
    #[schema(value_type = Object)]
    pub additional_information: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusEntity {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PasswordValue {
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UsernameEntity {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
}
