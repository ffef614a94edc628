//! Audit trail models

use super::common::ReferenceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Event types written by the management services
pub mod event_type {
    pub const DOMAIN_CREATED: &str = "DOMAIN_CREATED";
    pub const DOMAIN_UPDATED: &str = "DOMAIN_UPDATED";
    pub const DOMAIN_DELETED: &str = "DOMAIN_DELETED";
    pub const APPLICATION_CREATED: &str = "APPLICATION_CREATED";
    pub const APPLICATION_UPDATED: &str = "APPLICATION_UPDATED";
    pub const APPLICATION_DELETED: &str = "APPLICATION_DELETED";
    pub const APPLICATION_CLIENT_SECRET_RENEWED: &str = "APPLICATION_CLIENT_SECRET_RENEWED";
    pub const CERTIFICATE_CREATED: &str = "CERTIFICATE_CREATED";
    pub const CERTIFICATE_UPDATED: &str = "CERTIFICATE_UPDATED";
    pub const CERTIFICATE_DELETED: &str = "CERTIFICATE_DELETED";
    pub const IDENTITY_PROVIDER_CREATED: &str = "IDENTITY_PROVIDER_CREATED";
    pub const IDENTITY_PROVIDER_UPDATED: &str = "IDENTITY_PROVIDER_UPDATED";
    pub const IDENTITY_PROVIDER_DELETED: &str = "IDENTITY_PROVIDER_DELETED";
    pub const USER_CREATED: &str = "USER_CREATED";
    pub const USER_UPDATED: &str = "USER_UPDATED";
    pub const USER_DELETED: &str = "USER_DELETED";
    pub const USER_PASSWORD_RESET: &str = "USER_PASSWORD_RESET";
    pub const USER_LOCKED: &str = "USER_LOCKED";
    pub const USER_UNLOCKED: &str = "USER_UNLOCKED";
    pub const USERNAME_UPDATED: &str = "USERNAME_UPDATED";
    pub const POLICY_CREATED: &str = "POLICY_CREATED";
    pub const POLICY_UPDATED: &str = "POLICY_UPDATED";
    pub const POLICY_DELETED: &str = "POLICY_DELETED";
    pub const MEMBERSHIP_CREATED: &str = "MEMBERSHIP_CREATED";
    pub const MEMBERSHIP_UPDATED: &str = "MEMBERSHIP_UPDATED";
    pub const MEMBERSHIP_DELETED: &str = "MEMBERSHIP_DELETED";
    pub const PASSWORD_POLICY_CREATED: &str = "PASSWORD_POLICY_CREATED";
    pub const PASSWORD_POLICY_UPDATED: &str = "PASSWORD_POLICY_UPDATED";
    pub const PASSWORD_POLICY_DELETED: &str = "PASSWORD_POLICY_DELETED";
    pub const AUTHORIZATION_ENGINE_CREATED: &str = "AUTHORIZATION_ENGINE_CREATED";
    pub const AUTHORIZATION_ENGINE_UPDATED: &str = "AUTHORIZATION_ENGINE_UPDATED";
    pub const AUTHORIZATION_ENGINE_DELETED: &str = "AUTHORIZATION_ENGINE_DELETED";
}

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILURE: &str = "FAILURE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditOutcome {
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: String,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: AuditEntity,
    pub target: Option<AuditEntity>,
    pub outcome: AuditOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Filters for listing audits
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Event type
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Outcome status (SUCCESS or FAILURE)
    pub status: Option<String>,
    /// Actor id or display name
    pub user: Option<String>,
    /// Lower bound, epoch milliseconds
    pub from: Option<i64>,
    /// Upper bound, epoch milliseconds
    pub to: Option<i64>,
}

impl AuditQuery {
    pub fn matches(&self, audit: &Audit) -> bool {
        if let Some(event_type) = &self.event_type {
            if !audit.event_type.eq_ignore_ascii_case(event_type) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if !audit.outcome.status.eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if let Some(user) = &self.user {
            let by_name = audit
                .actor
                .display_name
                .as_deref()
                .map(|name| name.eq_ignore_ascii_case(user))
                .unwrap_or(false);
            if audit.actor.id != *user && !by_name {
                return false;
            }
        }
        let millis = audit.timestamp.timestamp_millis();
        if self.from.map(|from| millis < from).unwrap_or(false) {
            return false;
        }
        if self.to.map(|to| millis > to).unwrap_or(false) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit() -> Audit {
        Audit {
            id: "a-1".to_string(),
            reference_type: ReferenceType::Domain,
            reference_id: "dom-1".to_string(),
            event_type: event_type::APPLICATION_CREATED.to_string(),
            actor: AuditEntity {
                id: "admin".to_string(),
                entity_type: "USER".to_string(),
                display_name: Some("admin".to_string()),
            },
            target: None,
            outcome: AuditOutcome {
                status: STATUS_SUCCESS.to_string(),
                message: None,
            },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(AuditQuery::default().matches(&audit()));
    }

    #[test]
    fn test_query_filters() {
        let audit = audit();
        let query = AuditQuery {
            event_type: Some("application_created".to_string()),
            status: Some("success".to_string()),
            user: Some("admin".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&audit));

        let query = AuditQuery {
            event_type: Some(event_type::USER_CREATED.to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&audit));

        let query = AuditQuery {
            from: Some(audit.timestamp.timestamp_millis() + 1),
            ..Default::default()
        };
        assert!(!query.matches(&audit));
    }
}
