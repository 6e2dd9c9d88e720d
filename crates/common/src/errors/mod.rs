//! Error types for the conference services
//! 
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - Field-scoped form errors that are accumulated, not fail-fast
//! - HTTP status code mapping
//! - Structured error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    FormRejected,
    InvalidFormat,
    
    // Authentication errors (2xxx)
    Unauthorized,
    InvalidToken,
    ExpiredToken,
    
    // Authorization errors (3xxx)  
    Forbidden,
    
    // Resource errors (4xxx)
    NotFound,
    
    // Conflict errors (5xxx)
    Conflict,
    
    // Rate limiting (6xxx)
    RateLimited,
    
    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    MigrationError,
    
    // Storage errors (8xxx)
    StorageError,
    
    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    NotImplemented,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::FormRejected => 1002,
            ErrorCode::InvalidFormat => 1003,
            
            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidToken => 2002,
            ErrorCode::ExpiredToken => 2003,
            
            ErrorCode::Forbidden => 3001,
            
            ErrorCode::NotFound => 4001,
            
            ErrorCode::Conflict => 5001,
            
            ErrorCode::RateLimited => 6001,
            
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::MigrationError => 7003,
            
            ErrorCode::StorageError => 8001,
            
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::NotImplemented => 9003,
        }
    }
}

/// Field-scoped error messages collected while reviewing a submitted form.
///
/// Fields are kept sorted so responses are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Single-error shorthand
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
    
    /// Record an error against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }
    
    /// Absorb every error of another collection
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
    
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
    
    /// Messages recorded for a field (empty when the field is clean)
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
    
    /// Names of the fields carrying errors
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
    
    /// `Ok(())` when nothing was recorded, otherwise the whole collection as an error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Form(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { 
        message: String, 
        field: Option<String> 
    },
    
    #[error("Form rejected: {0}")]
    Form(FieldErrors),
    
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
    
    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },
    
    #[error("Invalid token")]
    InvalidToken,
    
    #[error("Token expired")]
    ExpiredToken,
    
    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },
    
    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },
    
    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },
    
    #[error("Conflict: {message}")]
    Conflict { message: String },
    
    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },
    
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    
    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },
    
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    
    // Document storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },
    
    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
    
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    
    #[error("Not implemented: {operation}")]
    NotImplemented { operation: String },
    
    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a missing resource
    pub fn not_found(resource_type: &str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }
    
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Form(_) => ErrorCode::FormRejected,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Duplicate { .. } |
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Migration(_) => ErrorCode::MigrationError,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::NotImplemented { .. } => ErrorCode::NotImplemented,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }
    
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,
            
            // 401 Unauthorized
            AppError::Unauthorized { .. } |
            AppError::InvalidToken |
            AppError::ExpiredToken => StatusCode::UNAUTHORIZED,
            
            // 403 Forbidden
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            
            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            
            // 409 Conflict
            AppError::Duplicate { .. } |
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            
            // 422 Unprocessable Entity, the form is sent back with its errors
            AppError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
            
            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            
            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Migration(_) |
            AppError::Storage { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            
            // 501 Not Implemented
            AppError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
        }
    }
    
    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
    
    /// Check if this error is a client error  
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
    
    /// Field errors carried by a rejected form
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Form(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        
        // Internal causes stay in the log; the client gets a generic message
        let message = if self.is_server_error() && !matches!(self, AppError::NotImplemented { .. }) {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
            "Internal server error".to_string()
        } else {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
            self.to_string()
        };
        
        let details = self
            .field_errors()
            .and_then(|errors| serde_json::to_value(errors).ok());
        
        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
            },
        };
        
        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage { 
            message: err.to_string() 
        }
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", err.code));
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}
