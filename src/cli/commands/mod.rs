//! CLI command implementations

pub mod import;
pub mod init;
pub mod retransform;
pub mod status;
pub mod validate;

use crate::adapters::geodesy::GeodesyClient;
use crate::adapters::store::create_stores;
use crate::config::GeoliftConfig;
use crate::core::import::ImportCoordinator;
use crate::domain::datum::DatumRegistry;
use crate::domain::ids::CrsId;
use crate::domain::{GeoliftError, Result};
use std::str::FromStr;
use std::sync::Arc;

/// Builds an import coordinator from configuration
///
/// Shared by the `import` and `retransform` commands.
pub(crate) async fn build_coordinator(
    config: &GeoliftConfig,
    dry_run: bool,
) -> Result<ImportCoordinator> {
    let (feature_store, job_store) = create_stores(config).await?;

    let geodesy = Arc::new(GeodesyClient::new(config.geodesy.clone())?);
    let registry = Arc::new(DatumRegistry::with_defaults());
    let canonical_crs = CrsId::from_str(&config.import.canonical_crs)
        .map_err(GeoliftError::Configuration)?;

    Ok(ImportCoordinator::new(
        feature_store,
        job_store,
        geodesy,
        registry,
        canonical_crs,
        config.import.max_concurrent_transforms,
        dry_run,
    ))
}
