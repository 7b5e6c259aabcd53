//! Store abstraction traits
//!
//! The spatial data store is reached through these narrow interfaces:
//! `FeatureStore` for collections/layers/feature rows and `JobStore` for
//! import-job state. The store's own concurrency control (row-level
//! isolation per feature insert) is assumed, not reimplemented here.

use crate::domain::feature::{HeightMode, HeightTransformationStatus, StoredFeature};
use crate::domain::ids::{CollectionId, CrsId, FeatureId, JobId, LayerId};
use crate::domain::job::ImportJob;
use crate::domain::Result;
use async_trait::async_trait;

/// Mutable height fields of a persisted feature
///
/// Geometry is immutable after creation; the out-of-band re-transformation
/// pass updates exactly this set of fields.
#[derive(Debug, Clone)]
pub struct HeightUpdate {
    pub base_elevation_ellipsoidal: Option<f64>,
    pub height_mode: HeightMode,
    pub vertical_datum_source: Option<String>,
    pub status: HeightTransformationStatus,
    pub error: Option<String>,
}

/// Feature storage interface
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Tests connectivity to the store
    async fn test_connection(&self) -> Result<()>;

    /// Creates a collection container
    async fn create_collection(&self, name: &str) -> Result<CollectionId>;

    /// Creates a layer within a collection
    async fn create_layer(
        &self,
        collection_id: &CollectionId,
        name: &str,
        crs: &CrsId,
    ) -> Result<LayerId>;

    /// Inserts one feature row
    async fn insert_feature(&self, feature: &StoredFeature) -> Result<()>;

    /// Returns all features of a layer
    async fn features_by_layer(&self, layer_id: &LayerId) -> Result<Vec<StoredFeature>>;

    /// Returns a layer's features whose height transformation is pending or
    /// failed, for the re-transformation pass
    async fn pending_height_features(&self, layer_id: &LayerId) -> Result<Vec<StoredFeature>>;

    /// Updates the height fields of one feature
    async fn update_feature_height(
        &self,
        feature_id: &FeatureId,
        update: &HeightUpdate,
    ) -> Result<()>;

    /// Deletes a layer, its features, and its collection container
    ///
    /// Used to roll back a totally-failed job so no partial artifact is
    /// left behind.
    async fn delete_layer_cascade(
        &self,
        collection_id: &CollectionId,
        layer_id: &LayerId,
    ) -> Result<()>;
}

/// Import-job storage interface
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persists a new job
    async fn create_job(&self, job: &ImportJob) -> Result<JobId>;

    /// Persists the current state of a job
    async fn update_job(&self, job: &ImportJob) -> Result<()>;

    /// Loads a job by id
    async fn get_job(&self, id: &JobId) -> Result<Option<ImportJob>>;

    /// Lists all jobs, most recent first
    async fn list_jobs(&self) -> Result<Vec<ImportJob>>;
}
