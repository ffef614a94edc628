//! Management token handling

use crate::config::JwtConfig;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a management API token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementClaims {
    /// Subject (organization user id)
    pub sub: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Organization the user belongs to
    pub org: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Token type discriminator
    #[serde(default)]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

const MANAGEMENT_TOKEN_TYPE: &str = "management";

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Result<Self> {
        let algorithm = if config.private_key_pem.is_some() {
            Algorithm::RS256
        } else {
            Algorithm::HS256
        };
        let encoding_key = match config.private_key_pem.as_ref() {
            Some(private_key) => EncodingKey::from_rsa_pem(private_key.as_bytes())?,
            None => EncodingKey::from_secret(config.secret.as_bytes()),
        };
        let decoding_key = match (&config.public_key_pem, &config.private_key_pem) {
            (Some(public_key), _) => DecodingKey::from_rsa_pem(public_key.as_bytes())?,
            (None, Some(_)) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "JWT_PUBLIC_KEY is required when JWT_PRIVATE_KEY is set"
                )))
            }
            (None, None) => DecodingKey::from_secret(config.secret.as_bytes()),
        };
        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            algorithm,
        })
    }

    /// Validation with a 5 second leeway instead of the default 60.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(self.algorithm);
        v.leeway = 5;
        v.set_audience(&[&self.config.audience]);
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    /// Create a management token for an organization user
    pub fn create_management_token(
        &self,
        user_id: &str,
        username: &str,
        display_name: Option<&str>,
        organization_id: &str,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_ttl_secs);

        let claims = ManagementClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            display_name: display_name.map(String::from),
            org: organization_id.to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            token_type: MANAGEMENT_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key).map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify and decode a management token
    pub fn verify_management_token(&self, token: &str) -> Result<ManagementClaims> {
        let token_data = decode::<ManagementClaims>(token, &self.decoding_key, &self.strict_validation())?;
        if token_data.claims.token_type != MANAGEMENT_TOKEN_TYPE {
            return Err(AppError::Unauthorized(format!(
                "Unexpected token type '{}'",
                token_data.claims.token_type
            )));
        }
        Ok(token_data.claims)
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.config.token_ttl_secs
    }
}
