//! Database layer for the conference service
//!
//! Provides:
//! - SeaORM entity models
//! - The persistence gateway contract and its SeaORM repository
//! - Connection pool management and migrations

mod gateway;
pub mod models;
mod repository;

pub use gateway::{
    random_address, ArticleGraph, ConferenceOverview, CurrentConference, DataGateway,
    UNIQUE_ADDRESS_LEN,
};
pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: Arc<DatabaseConnection>,
    
    /// Read replica connection (optional)
    pub replica: Option<Arc<DatabaseConnection>>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");
        
        let primary = Self::connect(&config.url, config)
            .await
            .map_err(|e| AppError::DatabaseConnection { 
                message: format!("Failed to connect to primary: {}", e) 
            })?;
        
        let replica = match config.read_url {
            Some(ref read_url) => {
                info!("Connecting to read replica...");
                let replica_conn = Self::connect(read_url, config)
                    .await
                    .map_err(|e| AppError::DatabaseConnection { 
                        message: format!("Failed to connect to replica: {}", e) 
                    })?;
                Some(replica_conn)
            }
            None => None,
        };
        
        info!("Database connections established");
        
        Ok(Self::from_connections(primary, replica))
    }
    
    /// Wrap already established connections
    pub fn from_connections(primary: DatabaseConnection, replica: Option<DatabaseConnection>) -> Self {
        Self {
            primary: Arc::new(primary),
            replica: replica.map(Arc::new),
        }
    }
    
    async fn connect(url: &str, config: &DatabaseConfig) -> std::result::Result<DatabaseConnection, sea_orm::DbErr> {
        let mut opts = ConnectOptions::new(url);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(true);
        
        Database::connect(opts).await
    }
    
    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_deref().unwrap_or(self.primary.as_ref())
    }
    
    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }
    
    /// Apply the SQL migrations shipped in `migrations/`
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        
        let pool = self.primary.get_postgres_connection_pool();
        sqlx::migrate!("../../migrations").run(pool).await?;
        
        info!("Database migrations applied");
        Ok(())
    }
    
    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        use sea_orm::ConnectionTrait;
        
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;
        
        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }
        
        Ok(())
    }
}
