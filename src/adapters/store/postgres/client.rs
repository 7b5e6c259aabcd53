//! PostgreSQL client
//!
//! Connection pooling and schema management for the PostgreSQL store
//! backend.

use crate::config::PostgreSQLConfig;
use crate::domain::{GeoliftError, Result, StoreError};
use deadpool_postgres::{Config as PoolConfig, Manager, ManagerConfig, Pool, RecyclingMethod};
use std::time::Duration;
use tokio_postgres::NoTls;

/// PostgreSQL client for Geolift
///
/// Provides pooled connections and schema initialization.
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Creates a new PostgreSQL client
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool
    /// cannot be created.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config.connection_string.parse().map_err(|e| {
            GeoliftError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
        })?;

        let mut pool_config = PoolConfig::new();
        pool_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            pool_config.manager.unwrap_or_else(|| ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            }),
        );

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(Duration::from_secs(config.connection_timeout_seconds)))
            .create_timeout(Some(Duration::from_secs(config.connection_timeout_seconds)))
            .recycle_timeout(Some(Duration::from_secs(config.connection_timeout_seconds)))
            .build()
            .map_err(|e| {
                GeoliftError::Store(StoreError::ConnectionFailed(format!(
                    "Failed to create connection pool: {e}"
                )))
            })?;

        Ok(Self { pool })
    }

    /// Tests the connection with a trivial query
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("Connection test failed: {e}")))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Ensures the database schema exists
    ///
    /// Runs the migration SQL to create tables and indexes if they don't
    /// exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        let migration_sql = include_str!("../../../../migrations/001_initial_schema.sql");

        client.batch_execute(migration_sql).await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to execute migration: {e}"))
        })?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Gets a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            GeoliftError::Store(StoreError::ConnectionFailed(format!(
                "Failed to get connection from pool: {e}"
            )))
        })
    }
}
