//! HTTP middleware for the management API
//!
//! - JWT authentication extractor (`AuthUser`)
//! - Request ID and metrics layer
//! - Security headers

pub mod auth;
pub mod metrics;
pub mod security_headers;

pub use auth::AuthUser;
pub use metrics::ObservabilityLayer;
pub use security_headers::security_headers_middleware;
