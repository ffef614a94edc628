//! Membership models

use super::common::ReferenceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    User,
    Group,
}

/// Grant of a role to a user or group on a reference
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    pub member_id: String,
    pub member_type: MemberType,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    /// Role id
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_on(&self, reference_type: ReferenceType, reference_id: &str) -> bool {
        self.reference_type == reference_type && self.reference_id == reference_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMembership {
    #[validate(length(min = 1))]
    pub member_id: String,
    pub member_type: MemberType,
    #[validate(length(min = 1))]
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MembershipMetadata {
    #[schema(value_type = Object)]
    pub users: HashMap<String, serde_json::Value>,
    #[schema(value_type = Object)]
    pub groups: HashMap<String, serde_json::Value>,
    #[schema(value_type = Object)]
    pub roles: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MembershipListItem {
    pub memberships: Vec<Membership>,
    pub metadata: MembershipMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_reference_match() {
        let now = Utc::now();
        let membership = Membership {
            id: "m-1".to_string(),
            member_id: "user-1".to_string(),
            member_type: MemberType::User,
            reference_type: ReferenceType::Domain,
            reference_id: "dom-1".to_string(),
            role: "domain-owner".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(membership.is_on(ReferenceType::Domain, "dom-1"));
        assert!(!membership.is_on(ReferenceType::Application, "dom-1"));
        assert!(!membership.is_on(ReferenceType::Domain, "dom-2"));

        let json = serde_json::to_value(&membership).unwrap();
        assert_eq!(json["memberType"], "USER");
        assert_eq!(json["referenceType"], "DOMAIN");
    }
}
