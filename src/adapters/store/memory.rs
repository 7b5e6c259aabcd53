//! In-memory store implementation
//!
//! Backs the `memory` store target. Useful for dry runs, tests, and
//! single-shot imports where no database is configured.

use crate::adapters::store::traits::{FeatureStore, HeightUpdate, JobStore};
use crate::domain::feature::{HeightTransformationStatus, StoredFeature};
use crate::domain::ids::{CollectionId, CrsId, FeatureId, JobId, LayerId};
use crate::domain::job::ImportJob;
use crate::domain::{Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

// The record mirrors the layer row shape; only existence checks read it.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct LayerRecord {
    collection_id: CollectionId,
    name: String,
    crs: CrsId,
}

/// In-memory feature and job store
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionId, String>>,
    layers: RwLock<HashMap<LayerId, LayerRecord>>,
    features: RwLock<Vec<StoredFeature>>,
    jobs: RwLock<HashMap<JobId, ImportJob>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collections currently held
    pub async fn collection_count(&self) -> usize {
        self.collections.read().await.len()
    }

    /// Number of layers currently held
    pub async fn layer_count(&self) -> usize {
        self.layers.read().await.len()
    }

    /// Number of features currently held
    pub async fn feature_count(&self) -> usize {
        self.features.read().await.len()
    }
}

#[async_trait]
impl FeatureStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionId> {
        let id = CollectionId::new();
        self.collections
            .write()
            .await
            .insert(id, name.to_string());
        Ok(id)
    }

    async fn create_layer(
        &self,
        collection_id: &CollectionId,
        name: &str,
        crs: &CrsId,
    ) -> Result<LayerId> {
        if !self.collections.read().await.contains_key(collection_id) {
            return Err(StoreError::NotFound(format!("collection {collection_id}")).into());
        }

        let id = LayerId::new();
        self.layers.write().await.insert(
            id,
            LayerRecord {
                collection_id: *collection_id,
                name: name.to_string(),
                crs: crs.clone(),
            },
        );
        Ok(id)
    }

    async fn insert_feature(&self, feature: &StoredFeature) -> Result<()> {
        if !self.layers.read().await.contains_key(&feature.layer_id) {
            return Err(StoreError::InsertFailed(format!(
                "layer {} does not exist",
                feature.layer_id
            ))
            .into());
        }

        self.features.write().await.push(feature.clone());
        Ok(())
    }

    async fn features_by_layer(&self, layer_id: &LayerId) -> Result<Vec<StoredFeature>> {
        Ok(self
            .features
            .read()
            .await
            .iter()
            .filter(|f| f.layer_id == *layer_id)
            .cloned()
            .collect())
    }

    async fn pending_height_features(&self, layer_id: &LayerId) -> Result<Vec<StoredFeature>> {
        Ok(self
            .features
            .read()
            .await
            .iter()
            .filter(|f| {
                f.layer_id == *layer_id
                    && matches!(
                        f.height_transformation_status,
                        HeightTransformationStatus::Pending | HeightTransformationStatus::Failed
                    )
            })
            .cloned()
            .collect())
    }

    async fn update_feature_height(
        &self,
        feature_id: &FeatureId,
        update: &HeightUpdate,
    ) -> Result<()> {
        let mut features = self.features.write().await;
        let feature = features
            .iter_mut()
            .find(|f| f.id == *feature_id)
            .ok_or_else(|| StoreError::NotFound(format!("feature {feature_id}")))?;

        feature.base_elevation_ellipsoidal = update.base_elevation_ellipsoidal;
        feature.height_mode = update.height_mode;
        feature.vertical_datum_source = update.vertical_datum_source.clone();
        feature.height_transformation_status = update.status;
        feature.height_transformation_error = update.error.clone();
        Ok(())
    }

    async fn delete_layer_cascade(
        &self,
        collection_id: &CollectionId,
        layer_id: &LayerId,
    ) -> Result<()> {
        self.features
            .write()
            .await
            .retain(|f| f.layer_id != *layer_id);
        self.layers.write().await.remove(layer_id);
        self.collections.write().await.remove(collection_id);
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: &ImportJob) -> Result<JobId> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job.id)
    }

    async fn update_job(&self, job: &ImportJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if !jobs.contains_key(&job.id) {
            return Err(StoreError::NotFound(format!("job {}", job.id)).into());
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<ImportJob>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<ImportJob>> {
        let mut jobs: Vec<ImportJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }
}
