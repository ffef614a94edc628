//! Configuration management for the management API

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment name ("development", "production", ...)
    pub environment: String,
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Public URL of the gateway, used to build domain entrypoints
    pub gateway_url: String,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Organization/admin seeded at startup
    pub bootstrap: BootstrapConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
    /// Security response headers
    pub security_headers: SecurityHeadersConfig,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl_secs: i64,
    pub private_key_pem: Option<String>,
    pub public_key_pem: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub organization_id: String,
    pub environment_id: String,
    /// User id granted ORGANIZATION_ADMIN on the bootstrap organization
    pub admin_user_id: String,
    pub admin_username: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            organization_id: "DEFAULT".to_string(),
            environment_id: "DEFAULT".to_string(),
            admin_user_id: "admin".to_string(),
            admin_username: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            service_name: "am-management".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    pub hsts_enabled: bool,
    pub hsts_max_age_secs: u64,
    /// Only send HSTS when the request came in over HTTPS (per X-Forwarded-Proto)
    pub hsts_https_only: bool,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            hsts_enabled: false,
            hsts_max_age_secs: 31_536_000,
            hsts_https_only: true,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let defaults = BootstrapConfig::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment != "production" => {
                "insecure-development-secret-change-me".to_string()
            }
            Err(_) => anyhow::bail!("JWT_SECRET is required in production"),
        };

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8093".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            gateway_url: env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:8092".to_string())
                .trim_end_matches('/')
                .to_string(),
            jwt: JwtConfig {
                secret: jwt_secret,
                issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "am-management".to_string()),
                audience: env::var("JWT_AUDIENCE")
                    .unwrap_or_else(|_| "am-management-api".to_string()),
                token_ttl_secs: env::var("JWT_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3600),
                private_key_pem: env::var("JWT_PRIVATE_KEY")
                    .ok()
                    .map(|value| value.replace("\\n", "\n")),
                public_key_pem: env::var("JWT_PUBLIC_KEY")
                    .ok()
                    .map(|value| value.replace("\\n", "\n")),
            },
            bootstrap: BootstrapConfig {
                organization_id: env::var("BOOTSTRAP_ORGANIZATION_ID")
                    .unwrap_or(defaults.organization_id),
                environment_id: env::var("BOOTSTRAP_ENVIRONMENT_ID")
                    .unwrap_or(defaults.environment_id),
                admin_user_id: env::var("BOOTSTRAP_ADMIN_USER_ID")
                    .unwrap_or(defaults.admin_user_id),
                admin_username: env::var("BOOTSTRAP_ADMIN_USERNAME")
                    .unwrap_or(defaults.admin_username),
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(|o| o.trim().to_string())
                            .filter(|o| !o.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env_flag("METRICS_ENABLED", false),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "am-management".to_string()),
            },
            security_headers: SecurityHeadersConfig {
                hsts_enabled: env_flag("HSTS_ENABLED", false),
                hsts_max_age_secs: env::var("HSTS_MAX_AGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(31_536_000),
                hsts_https_only: env_flag("HSTS_HTTPS_ONLY", true),
            },
            environment,
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            environment: "test".to_string(),
            http_host: "127.0.0.1".to_string(),
            http_port: 8093,
            gateway_url: "http://localhost:8092".to_string(),
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                issuer: "test".to_string(),
                audience: "test-api".to_string(),
                token_ttl_secs: 3600,
                private_key_pem: None,
                public_key_pem: None,
            },
            bootstrap: BootstrapConfig::default(),
            cors: CorsConfig::default(),
            telemetry: TelemetryConfig::default(),
            security_headers: SecurityHeadersConfig::default(),
        }
    }

    #[test]
    fn test_config_addresses() {
        let config = test_config();
        assert_eq!(config.http_addr(), "127.0.0.1:8093");
    }

    #[test]
    fn test_config_http_addr_ipv6() {
        let mut config = test_config();
        config.http_host = "::1".to_string();
        config.http_port = 3000;

        assert_eq!(config.http_addr(), "::1:3000");
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn test_bootstrap_defaults() {
        let bootstrap = BootstrapConfig::default();
        assert_eq!(bootstrap.organization_id, "DEFAULT");
        assert_eq!(bootstrap.environment_id, "DEFAULT");
        assert_eq!(bootstrap.admin_user_id, "admin");
    }

    #[test]
    fn test_security_headers_defaults() {
        let headers = SecurityHeadersConfig::default();
        assert!(!headers.hsts_enabled);
        assert!(headers.hsts_https_only);
        assert_eq!(headers.hsts_max_age_secs, 31_536_000);
    }
}
