//! Configuration management for the conference services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    
    /// Database configuration
    pub database: DatabaseConfig,
    
    /// Where uploaded and converted documents live
    #[serde(default)]
    pub storage: StorageConfig,
    
    /// External document converter
    #[serde(default)]
    pub converter: ConverterConfig,
    
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    
    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
    
    /// Rate limiting configuration for submissions
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    
    /// Largest accepted request body (document uploads)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,
    
    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,
    
    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    
    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    
    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    
    /// Apply pending SQL migrations on start-up
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding original documents and their HTML renditions
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConverterConfig {
    /// Converter executable
    #[serde(default = "default_converter_program")]
    pub program: String,
    
    /// Argument template; `{input}`, `{output}` and `{outdir}` are substituted
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
    
    /// Kill the converter after this many seconds
    #[serde(default = "default_converter_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token validation
    pub jwt_secret: Option<String>,
    
    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. `info`, `apit_gateway=debug`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    
    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,
    
    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_enabled")]
    pub metrics_enabled: bool,
    
    /// Service name for log records
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Submissions per second across the service
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,
    
    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,
    
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 60 }
fn default_max_upload_bytes() -> usize { 20 * 1024 * 1024 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_storage_root() -> PathBuf { PathBuf::from("storage/articles") }
fn default_converter_program() -> String { "soffice".to_string() }
fn default_converter_args() -> Vec<String> {
    [
        "--headless",
        "--convert-to",
        "htm:HTML (StarWriter)",
        "--outdir",
        "{outdir}",
        "{input}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_converter_timeout() -> u64 { 60 }
fn default_jwt_expiration() -> u64 { 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "apit".to_string() }
fn default_rate_limit() -> u32 { 5 }
fn default_burst() -> u32 { 20 }
fn default_enabled() -> bool { true }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: default_storage_root() }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_converter_program(),
            args: default_converter_args(),
            timeout_secs: default_converter_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_enabled(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        
        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            
            .build()?;
            
        config.try_deserialize()
    }
    
    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;
            
        config.try_deserialize()
    }
    
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
    
    /// Get converter timeout as Duration
    pub fn converter_timeout(&self) -> Duration {
        Duration::from_secs(self.converter.timeout_secs)
    }
    
    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                max_upload_bytes: default_max_upload_bytes(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/apit".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
                run_migrations: false,
            },
            storage: StorageConfig::default(),
            converter: ConverterConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.converter.program, "soffice");
        assert!(config.converter.args.iter().any(|a| a == "{input}"));
        assert_eq!(config.converter_timeout(), Duration::from_secs(60));
    }
    
    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/apit");
    }
    
    #[test]
    fn test_from_file_with_sparse_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apit.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9000

            [database]
            url = "postgres://db/conferences"

            [storage]
            root = "/var/lib/apit"
            "#,
        )
        .unwrap();
        
        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.storage.root, PathBuf::from("/var/lib/apit"));
        assert_eq!(config.rate_limit.burst, 20);
        assert!(config.auth.jwt_secret.is_none());
    }
}
