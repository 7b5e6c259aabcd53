//! PostgreSQL adapter implementing the store traits

use crate::adapters::store::postgres::client::PostgresClient;
use crate::adapters::store::postgres::models::{
    enum_to_text, feature_from_row, geometry_to_wkt, job_from_row,
};
use crate::adapters::store::traits::{FeatureStore, HeightUpdate, JobStore};
use crate::domain::feature::StoredFeature;
use crate::domain::ids::{CollectionId, CrsId, FeatureId, JobId, LayerId};
use crate::domain::job::ImportJob;
use crate::domain::{Result, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// PostgreSQL implementation of the feature and job stores
pub struct PostgresAdapter {
    client: Arc<PostgresClient>,
}

impl PostgresAdapter {
    /// Creates a new adapter
    pub fn new(client: PostgresClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Access to the underlying client
    pub fn client(&self) -> &Arc<PostgresClient> {
        &self.client
    }
}

#[async_trait]
impl FeatureStore for PostgresAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionId> {
        let conn = self.client.get_connection().await?;
        let id = CollectionId::new();

        conn.execute(
            "INSERT INTO collections (id, name) VALUES ($1, $2)",
            &[id.as_uuid(), &name],
        )
        .await
        .map_err(|e| StoreError::InsertFailed(format!("collection: {e}")))?;

        Ok(id)
    }

    async fn create_layer(
        &self,
        collection_id: &CollectionId,
        name: &str,
        crs: &CrsId,
    ) -> Result<LayerId> {
        let conn = self.client.get_connection().await?;
        let id = LayerId::new();

        conn.execute(
            "INSERT INTO layers (id, collection_id, name, crs) VALUES ($1, $2, $3, $4)",
            &[id.as_uuid(), collection_id.as_uuid(), &name, &crs.as_str()],
        )
        .await
        .map_err(|e| StoreError::InsertFailed(format!("layer: {e}")))?;

        Ok(id)
    }

    async fn insert_feature(&self, feature: &StoredFeature) -> Result<()> {
        let conn = self.client.get_connection().await?;

        let footprint_wkt = geometry_to_wkt(&feature.footprint);
        let height_mode = enum_to_text(&feature.height_mode)?;
        let status = enum_to_text(&feature.height_transformation_status)?;
        let attributes = Value::Object(feature.attributes.clone());

        conn.execute(
            "INSERT INTO features (
                id, layer_id, footprint_wkt, base_elevation_ellipsoidal,
                object_height, height_mode, height_source, vertical_datum_source,
                height_transformation_status, height_transformation_error,
                attributes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            &[
                feature.id.as_uuid(),
                feature.layer_id.as_uuid(),
                &footprint_wkt,
                &feature.base_elevation_ellipsoidal,
                &feature.object_height,
                &height_mode,
                &feature.height_source,
                &feature.vertical_datum_source,
                &status,
                &feature.height_transformation_error,
                &attributes,
                &feature.created_at,
            ],
        )
        .await
        .map_err(|e| StoreError::InsertFailed(format!("feature: {e}")))?;

        Ok(())
    }

    async fn features_by_layer(&self, layer_id: &LayerId) -> Result<Vec<StoredFeature>> {
        let conn = self.client.get_connection().await?;

        let rows = conn
            .query(
                "SELECT * FROM features WHERE layer_id = $1 ORDER BY created_at",
                &[layer_id.as_uuid()],
            )
            .await
            .map_err(|e| StoreError::QueryFailed(format!("features: {e}")))?;

        rows.iter().map(feature_from_row).collect()
    }

    async fn pending_height_features(&self, layer_id: &LayerId) -> Result<Vec<StoredFeature>> {
        let conn = self.client.get_connection().await?;

        let rows = conn
            .query(
                "SELECT * FROM features
                 WHERE layer_id = $1
                   AND height_transformation_status IN ('pending', 'failed')
                 ORDER BY created_at",
                &[layer_id.as_uuid()],
            )
            .await
            .map_err(|e| StoreError::QueryFailed(format!("pending features: {e}")))?;

        rows.iter().map(feature_from_row).collect()
    }

    async fn update_feature_height(
        &self,
        feature_id: &FeatureId,
        update: &HeightUpdate,
    ) -> Result<()> {
        let conn = self.client.get_connection().await?;

        let height_mode = enum_to_text(&update.height_mode)?;
        let status = enum_to_text(&update.status)?;

        let updated = conn
            .execute(
                "UPDATE features SET
                    base_elevation_ellipsoidal = $2,
                    height_mode = $3,
                    vertical_datum_source = $4,
                    height_transformation_status = $5,
                    height_transformation_error = $6
                 WHERE id = $1",
                &[
                    feature_id.as_uuid(),
                    &update.base_elevation_ellipsoidal,
                    &height_mode,
                    &update.vertical_datum_source,
                    &status,
                    &update.error,
                ],
            )
            .await
            .map_err(|e| StoreError::UpdateFailed(format!("feature height: {e}")))?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("feature {feature_id}")).into());
        }

        Ok(())
    }

    async fn delete_layer_cascade(
        &self,
        collection_id: &CollectionId,
        layer_id: &LayerId,
    ) -> Result<()> {
        let conn = self.client.get_connection().await?;

        // Features and layers cascade from the collection delete; the layer
        // delete is explicit in case the collection is shared.
        conn.execute("DELETE FROM layers WHERE id = $1", &[layer_id.as_uuid()])
            .await
            .map_err(|e| StoreError::DeleteFailed(format!("layer: {e}")))?;

        conn.execute(
            "DELETE FROM collections WHERE id = $1",
            &[collection_id.as_uuid()],
        )
        .await
        .map_err(|e| StoreError::DeleteFailed(format!("collection: {e}")))?;

        tracing::info!(
            collection_id = %collection_id,
            layer_id = %layer_id,
            "Rolled back layer and collection"
        );

        Ok(())
    }
}

#[async_trait]
impl JobStore for PostgresAdapter {
    async fn create_job(&self, job: &ImportJob) -> Result<JobId> {
        let conn = self.client.get_connection().await?;

        let status = enum_to_text(&job.status)?;
        let debug_info = serde_json::to_value(&job.debug_info)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO import_jobs (
                id, layer_id, layer_name, total_features, imported_count,
                failed_count, skipped_count, status, debug_info, created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            &[
                job.id.as_uuid(),
                &job.layer_id.map(|l| *l.as_uuid()),
                &job.layer_name,
                &(job.total_features as i64),
                &(job.imported_count as i64),
                &(job.failed_count as i64),
                &(job.skipped_count as i64),
                &status,
                &debug_info,
                &job.created_at,
                &job.updated_at,
            ],
        )
        .await
        .map_err(|e| StoreError::InsertFailed(format!("job: {e}")))?;

        Ok(job.id)
    }

    async fn update_job(&self, job: &ImportJob) -> Result<()> {
        let conn = self.client.get_connection().await?;

        let status = enum_to_text(&job.status)?;
        let debug_info = serde_json::to_value(&job.debug_info)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let updated = conn
            .execute(
                "UPDATE import_jobs SET
                    layer_id = $2,
                    imported_count = $3,
                    failed_count = $4,
                    skipped_count = $5,
                    status = $6,
                    debug_info = $7,
                    updated_at = $8
                 WHERE id = $1",
                &[
                    job.id.as_uuid(),
                    &job.layer_id.map(|l| *l.as_uuid()),
                    &(job.imported_count as i64),
                    &(job.failed_count as i64),
                    &(job.skipped_count as i64),
                    &status,
                    &debug_info,
                    &job.updated_at,
                ],
            )
            .await
            .map_err(|e| StoreError::UpdateFailed(format!("job: {e}")))?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("job {}", job.id)).into());
        }

        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<ImportJob>> {
        let conn = self.client.get_connection().await?;

        let row = conn
            .query_opt("SELECT * FROM import_jobs WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(|e| StoreError::QueryFailed(format!("job: {e}")))?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_jobs(&self) -> Result<Vec<ImportJob>> {
        let conn = self.client.get_connection().await?;

        let rows = conn
            .query("SELECT * FROM import_jobs ORDER BY created_at DESC", &[])
            .await
            .map_err(|e| StoreError::QueryFailed(format!("jobs: {e}")))?;

        rows.iter().map(job_from_row).collect()
    }
}

// Status texts in pending_height_features must match the serde names.
#[cfg(test)]
mod tests {
    use crate::adapters::store::postgres::models::enum_to_text;
    use crate::domain::feature::HeightTransformationStatus;

    #[test]
    fn test_pending_query_status_names() {
        assert_eq!(
            enum_to_text(&HeightTransformationStatus::Pending).unwrap(),
            "pending"
        );
        assert_eq!(
            enum_to_text(&HeightTransformationStatus::Failed).unwrap(),
            "failed"
        );
    }
}
