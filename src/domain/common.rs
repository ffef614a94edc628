//! Common types shared by every domain model

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Level of the management hierarchy a resource or membership is attached to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Platform,
    Organization,
    Environment,
    Domain,
    Application,
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceType::Platform => "PLATFORM",
            ReferenceType::Organization => "ORGANIZATION",
            ReferenceType::Environment => "ENVIRONMENT",
            ReferenceType::Domain => "DOMAIN",
            ReferenceType::Application => "APPLICATION",
        };
        write!(f, "{}", s)
    }
}

/// Generate a new opaque resource id
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Lowercase, hyphen separated identifier derived from a display name
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_type_serialization() {
        let json = serde_json::to_string(&ReferenceType::Environment).unwrap();
        assert_eq!(json, "\"ENVIRONMENT\"");

        let parsed: ReferenceType = serde_json::from_str("\"APPLICATION\"").unwrap();
        assert_eq!(parsed, ReferenceType::Application);
        assert_eq!(parsed.to_string(), "APPLICATION");
    }

    #[test]
    fn test_new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(!a.contains('-'));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Domain"), "my-domain");
        assert_eq!(slugify("  Acme -- Corp!! "), "acme-corp");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("***"), "");
    }
}
