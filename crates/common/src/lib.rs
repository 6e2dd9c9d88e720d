//! Apit Common Library
//! 
//! Shared code for the conference services including:
//! - Database models and the persistence gateway
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, FieldErrors, Result};
pub use config::AppConfig;
pub use db::{DataGateway, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
