//! Import coordinator - main orchestrator for the feature import pipeline
//!
//! Drives per-feature processing in fixed-size batches: validation and
//! repair, footprint reprojection, height resolution, vertical datum
//! transformation, and persistence. Batches run strictly sequentially and
//! the CPU-bound stages within a batch are sequential too; only the
//! geodesy-service calls fan out over a bounded worker pool, and their
//! results are written back in input order before the batch counters
//! update.

use crate::adapters::geodesy::GeodesyClient;
use crate::adapters::store::traits::{FeatureStore, HeightUpdate, JobStore};
use crate::core::height::transformer::{DatumResolution, DatumTransformer};
use crate::core::height::ResolvedHeight;
use crate::core::import::batch::{FeatureProcessor, PreparedFeature, PreparedOutcome};
use crate::core::import::summary::ImportSummary;
use crate::core::state::tracker::{JobTracker, JobUpdate};
use crate::domain::datum::DatumRegistry;
use crate::domain::feature::{
    HeightMode, HeightTransformationStatus, StoredFeature, StoredFeatureBuilder,
};
use crate::domain::ids::{CollectionId, CrsId, LayerId};
use crate::domain::job::{FeatureError, ImportJob, ImportOutcome, ImportRequest, RetransformOutcome};
use crate::domain::{GeoliftError, Result};
use futures::stream::{self, StreamExt};
use geo_types::Coord;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Import coordinator
pub struct ImportCoordinator {
    feature_store: Arc<dyn FeatureStore>,
    tracker: JobTracker,
    geodesy: Arc<GeodesyClient>,
    registry: Arc<DatumRegistry>,
    canonical_crs: CrsId,
    max_concurrent_transforms: usize,
    dry_run: bool,
}

impl ImportCoordinator {
    /// Creates a new import coordinator
    pub fn new(
        feature_store: Arc<dyn FeatureStore>,
        job_store: Arc<dyn JobStore>,
        geodesy: Arc<GeodesyClient>,
        registry: Arc<DatumRegistry>,
        canonical_crs: CrsId,
        max_concurrent_transforms: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            feature_store,
            tracker: JobTracker::new(job_store),
            geodesy,
            registry,
            canonical_crs,
            max_concurrent_transforms,
            dry_run,
        }
    }

    /// Access to the job tracker, for status queries
    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    /// Executes one import job
    ///
    /// This is the main entry point for the pipeline. It:
    /// 1. Creates the job record and the output collection/layer containers
    /// 2. Splits the feature array into fixed-size batches
    /// 3. Runs each feature through validate -> reproject -> resolve height
    ///    -> transform datum -> persist, isolating failures per feature
    /// 4. Checkpoints counters and diagnostics after every batch
    /// 5. Rolls back all artifacts if zero features were imported while at
    ///    least one was attempted
    ///
    /// The shutdown signal is honored between batches: in-flight work
    /// completes, further batches are not submitted.
    pub async fn execute_import(
        &self,
        request: ImportRequest,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ImportOutcome> {
        let start_time = Instant::now();

        if request.target_layer_name.trim().is_empty() {
            return Err(GeoliftError::Validation(
                "target_layer_name cannot be empty".to_string(),
            ));
        }

        let total = request.features.len();
        let batch_size = request.batch_size.max(1);
        let target_crs = request
            .target_crs
            .clone()
            .unwrap_or_else(|| self.canonical_crs.clone());
        let mut summary = ImportSummary::new();
        if request.batch_size == 0 {
            summary.notice("batch_size 0 clamped to 1");
        }

        let job = ImportJob::new(&request.target_layer_name, total);
        let job_id = self.tracker.create(&job).await?;

        tracing::info!(
            job_id = %job_id,
            layer_name = %request.target_layer_name,
            total_features = total,
            batch_size = batch_size,
            source_crs = %request.source_crs,
            target_crs = %target_crs,
            "Starting import"
        );

        // The output containers are created exactly once, up front.
        let (collection_id, layer_id) = if self.dry_run {
            tracing::info!("Dry-run mode - no store writes will be performed");
            (None, None)
        } else {
            match self.create_containers(&request, &target_crs).await {
                Ok(ids) => ids,
                Err(e) => {
                    self.tracker
                        .update(
                            &job_id,
                            JobUpdate {
                                error: Some(format!("failed to create output containers: {e}")),
                                ..Default::default()
                            },
                        )
                        .await?;
                    return Err(e);
                }
            }
        };

        let processor = FeatureProcessor::new(
            request.source_crs.clone(),
            target_crs,
            request.height_attribute.clone(),
            request.object_height_attribute.clone(),
        );
        let transformer = DatumTransformer::new(self.geodesy.clone(), self.registry.clone());

        let total_batches = total.div_ceil(batch_size);
        for (batch_index, batch) in request.features.chunks(batch_size).enumerate() {
            if *shutdown.borrow() {
                tracing::warn!(
                    batch = batch_index + 1,
                    total_batches = total_batches,
                    "Shutdown requested - stopping before next batch"
                );
                summary.notice(format!(
                    "shutdown requested - stopped before batch {}/{}",
                    batch_index + 1,
                    total_batches
                ));
                break;
            }

            let batch_summary = self
                .process_batch(
                    batch_index * batch_size,
                    batch,
                    &processor,
                    &transformer,
                    layer_id,
                    &request.source_crs,
                )
                .await?;
            summary.merge(batch_summary);
            summary.notice(format!(
                "batch {}/{} processed (imported={}, failed={}, skipped={})",
                batch_index + 1,
                total_batches,
                summary.imported,
                summary.failed,
                summary.skipped
            ));

            // Checkpoint all but the final state; the terminal status is
            // decided after the abort rule below.
            if batch_index + 1 < total_batches {
                self.tracker
                    .update(
                        &job_id,
                        JobUpdate {
                            imported_count: summary.imported,
                            failed_count: summary.failed,
                            skipped_count: summary.skipped,
                            layer_id,
                            debug_info: Some(summary.debug_info()),
                            error: None,
                        },
                    )
                    .await?;
            }
        }

        // Completion rule: zero imported with at least one attempted fails
        // the job atomically - no partial artifact is left behind.
        let aborted = summary.attempted() > 0 && summary.imported == 0;
        if aborted {
            summary.notice("zero features imported - job aborted, artifacts rolled back");
            if let (Some(cid), Some(lid)) = (collection_id, layer_id) {
                if let Err(e) = self.feature_store.delete_layer_cascade(&cid, &lid).await {
                    tracing::error!(error = %e, "Failed to roll back job artifacts");
                }
            }
        }

        let final_job = self
            .tracker
            .update(
                &job_id,
                JobUpdate {
                    imported_count: summary.imported,
                    failed_count: summary.failed,
                    skipped_count: summary.skipped,
                    layer_id: if aborted { None } else { layer_id },
                    debug_info: Some(summary.debug_info()),
                    error: aborted.then(|| "job aborted: zero features imported".to_string()),
                },
            )
            .await?;

        summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        Ok(ImportOutcome {
            job_id,
            status: final_job.status,
            collection_id: if aborted { None } else { collection_id },
            layer_id: if aborted { None } else { layer_id },
            imported_count: summary.imported,
            failed_count: summary.failed,
            skipped_count: summary.skipped,
            debug_info: summary.debug_info(),
        })
    }

    /// Re-runs the vertical datum transformation for a layer's features
    /// whose height transformation is pending or failed
    ///
    /// Only the height fields are mutated; geometry is immutable after
    /// creation. Features lacking preserved source coordinates or height
    /// cannot be re-resolved and are left untouched.
    pub async fn retransform_layer(
        &self,
        layer_id: &LayerId,
        source_crs: &CrsId,
    ) -> Result<RetransformOutcome> {
        let features = self.feature_store.pending_height_features(layer_id).await?;
        let transformer = DatumTransformer::new(self.geodesy.clone(), self.registry.clone());
        let mut outcome = RetransformOutcome {
            attempted: 0,
            completed: 0,
            failed: 0,
        };

        tracing::info!(
            layer_id = %layer_id,
            candidates = features.len(),
            "Re-running height transformation"
        );

        for feature in features {
            let Some(point) = source_point_from_attributes(&feature.attributes) else {
                tracing::warn!(
                    feature_id = %feature.id,
                    "Skipping feature without preserved source coordinates"
                );
                continue;
            };
            let Some(value) = numeric_attribute(&feature.attributes, "_source_height") else {
                tracing::warn!(
                    feature_id = %feature.id,
                    "Skipping feature without preserved source height"
                );
                continue;
            };

            let resolved = ResolvedHeight {
                value,
                source: feature
                    .height_source
                    .clone()
                    .unwrap_or_else(|| "attribute:_source_height".to_string()),
            };

            let update = match transformer
                .resolve_elevation(source_crs, point, Some(&resolved))
                .await
            {
                DatumResolution::NoHeight => continue,
                DatumResolution::Complete {
                    elevation, datum, ..
                } => {
                    outcome.attempted += 1;
                    outcome.completed += 1;
                    HeightUpdate {
                        base_elevation_ellipsoidal: Some(elevation),
                        height_mode: HeightMode::AbsoluteEllipsoidal,
                        vertical_datum_source: Some(datum),
                        status: HeightTransformationStatus::Complete,
                        error: None,
                    }
                }
                DatumResolution::Failed { message, datum } => {
                    outcome.attempted += 1;
                    outcome.failed += 1;
                    HeightUpdate {
                        base_elevation_ellipsoidal: None,
                        height_mode: HeightMode::Lv95Stored,
                        vertical_datum_source: Some(datum),
                        status: HeightTransformationStatus::Failed,
                        error: Some(message),
                    }
                }
                DatumResolution::UnknownDatum => {
                    outcome.attempted += 1;
                    outcome.failed += 1;
                    HeightUpdate {
                        base_elevation_ellipsoidal: None,
                        height_mode: HeightMode::Unknown,
                        vertical_datum_source: None,
                        status: HeightTransformationStatus::Failed,
                        error: Some(format!(
                            "no vertical datum reference for frame {source_crs}"
                        )),
                    }
                }
            };

            self.feature_store
                .update_feature_height(&feature.id, &update)
                .await?;
        }

        tracing::info!(
            attempted = outcome.attempted,
            completed = outcome.completed,
            failed = outcome.failed,
            "Height re-transformation finished"
        );

        Ok(outcome)
    }

    async fn create_containers(
        &self,
        request: &ImportRequest,
        target_crs: &CrsId,
    ) -> Result<(Option<CollectionId>, Option<LayerId>)> {
        let collection_id = self
            .feature_store
            .create_collection(&request.target_layer_name)
            .await?;
        let layer_id = self
            .feature_store
            .create_layer(&collection_id, &request.target_layer_name, target_crs)
            .await?;

        tracing::debug!(
            collection_id = %collection_id,
            layer_id = %layer_id,
            "Created output containers"
        );

        Ok((Some(collection_id), Some(layer_id)))
    }

    /// Processes one batch of features
    async fn process_batch(
        &self,
        offset: usize,
        features: &[crate::domain::feature::RawFeature],
        processor: &FeatureProcessor,
        transformer: &DatumTransformer,
        layer_id: Option<LayerId>,
        source_crs: &CrsId,
    ) -> Result<ImportSummary> {
        let mut outcome = ImportSummary::new();

        // CPU-bound stages, strictly sequential.
        let mut ready = Vec::new();
        for (i, feature) in features.iter().enumerate() {
            match processor.prepare(offset + i, feature) {
                PreparedOutcome::Skipped { error } => {
                    tracing::debug!(index = error.index, message = %error.message, "Skipping feature");
                    outcome.skipped += 1;
                    outcome.feature_errors.push(error);
                }
                PreparedOutcome::Failed { error } => {
                    tracing::debug!(index = error.index, message = %error.message, "Feature failed");
                    outcome.failed += 1;
                    outcome.feature_errors.push(error);
                }
                PreparedOutcome::Prepared(prepared) => ready.push(*prepared),
            }
        }

        // I/O-bound datum resolution over a bounded worker pool. A single
        // feature's timeout never affects its siblings.
        let concurrency = self.max_concurrent_transforms.max(1);
        let mut resolutions: Vec<(PreparedFeature, DatumResolution)> =
            stream::iter(ready.into_iter().map(|prepared| async move {
                let resolution = transformer
                    .resolve_elevation(
                        source_crs,
                        prepared.source_point,
                        prepared.resolved_height.as_ref(),
                    )
                    .await;
                (prepared, resolution)
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Serialize result writes in input order before counters update.
        resolutions.sort_by_key(|(prepared, _)| prepared.index);

        for (prepared, resolution) in resolutions {
            let index = prepared.index;
            let stored = self.build_feature(
                layer_id.unwrap_or_default(),
                prepared,
                resolution,
                source_crs,
                &mut outcome,
            )?;

            if self.dry_run {
                outcome.imported += 1;
                continue;
            }

            match self.feature_store.insert_feature(&stored).await {
                Ok(()) => outcome.imported += 1,
                Err(e) => {
                    tracing::warn!(index = index, error = %e, "Failed to persist feature");
                    outcome.failed += 1;
                    outcome
                        .feature_errors
                        .push(FeatureError::new(index, format!("failed to persist feature: {e}")));
                }
            }
        }

        Ok(outcome)
    }

    /// Builds the persisted feature row from a prepared feature and its
    /// datum resolution
    fn build_feature(
        &self,
        layer_id: LayerId,
        mut prepared: PreparedFeature,
        resolution: DatumResolution,
        source_crs: &CrsId,
        summary: &mut ImportSummary,
    ) -> Result<StoredFeature> {
        let index = prepared.index;
        summary.notices.append(&mut prepared.notices);

        let mut builder = StoredFeatureBuilder::new(layer_id, prepared.footprint)
            .attributes(prepared.attributes);

        if let Some(height) = prepared.object_height {
            builder = builder.object_height(height);
        }
        if let Some(resolved) = &prepared.resolved_height {
            builder = builder.height_source(resolved.source.clone());
        }

        let feature = match resolution {
            DatumResolution::NoHeight => builder
                .height_mode(HeightMode::ClampToGround)
                .transformation_status(HeightTransformationStatus::NotRequired)
                .build()?,
            DatumResolution::Complete {
                elevation,
                datum,
                via_service,
            } => {
                if via_service {
                    tracing::debug!(index = index, elevation = elevation, "Height transformed");
                }
                builder
                    .base_elevation(elevation)
                    .height_mode(HeightMode::AbsoluteEllipsoidal)
                    .vertical_datum_source(datum)
                    .transformation_status(HeightTransformationStatus::Complete)
                    .build()?
            }
            DatumResolution::Failed { message, datum } => {
                summary.notice(format!(
                    "feature {index}: height transformation failed: {message}"
                ));
                builder
                    .height_mode(HeightMode::Lv95Stored)
                    .vertical_datum_source(datum)
                    .transformation_status(HeightTransformationStatus::Failed)
                    .transformation_error(message)
                    .build()?
            }
            DatumResolution::UnknownDatum => {
                let message = format!("no vertical datum reference for frame {source_crs}");
                summary.notice(format!("feature {index}: {message}"));
                builder
                    .height_mode(HeightMode::Unknown)
                    .transformation_status(HeightTransformationStatus::Failed)
                    .transformation_error(message)
                    .build()?
            }
        };

        Ok(feature)
    }
}

fn source_point_from_attributes(attributes: &Map<String, Value>) -> Option<Coord<f64>> {
    let arr = attributes.get("_source_coordinates")?.as_array()?;
    let x = arr.first()?.as_f64()?;
    let y = arr.get(1)?.as_f64()?;
    Some(Coord { x, y })
}

fn numeric_attribute(attributes: &Map<String, Value>, name: &str) -> Option<f64> {
    attributes.get(name)?.as_f64().filter(|v| v.is_finite())
}
