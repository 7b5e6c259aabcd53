//! Store factory
//!
//! Creates the feature and job store implementations selected by the
//! configuration. Both traits are served by one backend instance so a
//! job and its features land in the same place.

use crate::adapters::store::memory::MemoryStore;
use crate::adapters::store::postgres::{PostgresAdapter, PostgresClient};
use crate::adapters::store::traits::{FeatureStore, JobStore};
use crate::config::{GeoliftConfig, StoreTarget};
use crate::domain::{GeoliftError, Result};
use std::sync::Arc;

/// Creates the feature and job stores for the configured target
///
/// # Errors
///
/// Returns an error if the backend cannot be initialized (e.g. the
/// PostgreSQL pool cannot be created or the schema migration fails).
pub async fn create_stores(
    config: &GeoliftConfig,
) -> Result<(Arc<dyn FeatureStore>, Arc<dyn JobStore>)> {
    match config.store_target {
        StoreTarget::Memory => {
            tracing::info!("Using in-memory store");
            let store = Arc::new(MemoryStore::new());
            Ok((store.clone() as Arc<dyn FeatureStore>, store as Arc<dyn JobStore>))
        }
        StoreTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                GeoliftError::Configuration(
                    "postgresql configuration is required when store_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = PostgresClient::new(pg_config.clone()).await?;
            client.ensure_schema().await?;

            let adapter = Arc::new(PostgresAdapter::new(client));
            Ok((
                adapter.clone() as Arc<dyn FeatureStore>,
                adapter as Arc<dyn JobStore>,
            ))
        }
    }
}
