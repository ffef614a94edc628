//! AM Management - administration API for security domains
//!
//! This crate provides the management REST layer of the access management
//! platform: domains and their applications, certificates, identity providers,
//! users, policies, members, password policies, authorization engines and audits.

pub mod api;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod memory;
pub mod middleware;
pub mod openapi;
pub mod permission;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
