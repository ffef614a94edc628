//! Certificate models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const USAGE_SIGNATURE: &str = "sig";
pub const USAGE_ENCRYPTION: &str = "enc";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub cert_type: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    pub domain: String,
    /// Key usages, `sig` and/or `enc`
    pub usage: Vec<String>,
    pub system: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub public_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    pub fn has_usage(&self, usage: &str) -> bool {
        self.usage.iter().any(|u| u.eq_ignore_ascii_case(usage))
    }

    /// Public key in every format the certificate can export
    pub fn keys(&self) -> Vec<CertificateKey> {
        vec![
            CertificateKey {
                fmt: "pem".to_string(),
                payload: format!(
                    "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
                    self.public_key
                ),
            },
            CertificateKey {
                fmt: "base64".to_string(),
                payload: self.public_key.clone(),
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub cert_type: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCertificate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CertificateKey {
    pub fmt: String,
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_keys_and_usage() {
        let now = Utc::now();
        let cert = Certificate {
            id: "cert-1".to_string(),
            name: "Default".to_string(),
            cert_type: "javakeystore-am-certificate".to_string(),
            configuration: serde_json::json!({}),
            domain: "dom-1".to_string(),
            usage: vec![USAGE_SIGNATURE.to_string()],
            system: true,
            expires_at: None,
            public_key: "QUJD".to_string(),
            created_at: now,
            updated_at: now,
        };

        assert!(cert.has_usage("SIG"));
        assert!(!cert.has_usage(USAGE_ENCRYPTION));

        let keys = cert.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].payload.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(keys[1].payload, "QUJD");

        let json = serde_json::to_value(&cert).unwrap();
        assert!(json.get("publicKey").is_none());
        assert_eq!(json["type"], "javakeystore-am-certificate");
    }
}
