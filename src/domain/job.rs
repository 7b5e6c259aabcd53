//! Import job models
//!
//! One `ImportJob` records a single invocation of the pipeline: feature
//! counters, lifecycle status, and structured diagnostics. The request and
//! outcome types form the external contract with the upload layer.

use crate::domain::feature::RawFeature;
use crate::domain::ids::{CollectionId, CrsId, JobId, LayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, no batch processed yet
    Started,
    /// At least one batch processed
    Processing,
    /// Terminal: finished with whatever imported/failed/skipped split occurred
    Completed,
    /// Terminal: aborted (zero imported) or unrecoverable error
    Failed,
}

impl JobStatus {
    /// Whether the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Per-feature diagnostic entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureError {
    /// Index of the feature in the input array
    pub index: usize,

    /// Error message
    pub message: String,

    /// Optional diagnostic detail (e.g. the original invalidity reason)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FeatureError {
    /// Creates a new per-feature diagnostic entry
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
            detail: None,
        }
    }

    /// Attaches a diagnostic detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Structured diagnostics accumulated over a job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Informational notices in processing order
    pub notices: Vec<String>,

    /// Per-feature errors in processing order
    pub feature_errors: Vec<FeatureError>,
}

/// One invocation of the import pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    /// Job identifier
    pub id: JobId,

    /// Target layer, set once the container is created
    pub layer_id: Option<LayerId>,

    /// Target layer name as requested by the caller
    pub layer_name: String,

    /// Number of input features
    pub total_features: usize,

    /// Features persisted successfully
    pub imported_count: usize,

    /// Features that failed processing
    pub failed_count: usize,

    /// Features skipped before processing (missing/unparsable geometry)
    pub skipped_count: usize,

    /// Lifecycle status
    pub status: JobStatus,

    /// Structured diagnostics
    pub debug_info: DebugInfo,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ImportJob {
    /// Creates a job in the `Started` state
    pub fn new(layer_name: impl Into<String>, total_features: usize) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            layer_id: None,
            layer_name: layer_name.into(),
            total_features,
            imported_count: 0,
            failed_count: 0,
            skipped_count: 0,
            status: JobStatus::Started,
            debug_info: DebugInfo::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of features accounted for so far
    pub fn accounted(&self) -> usize {
        self.imported_count + self.failed_count + self.skipped_count
    }

    /// Whether the counters are consistent with the input size
    pub fn counts_consistent(&self) -> bool {
        self.accounted() <= self.total_features
    }

    /// Marks the job as processing
    ///
    /// Terminal statuses are monotonic: this is a no-op once the job has
    /// completed or failed, guarding against out-of-order batch signals.
    pub fn mark_processing(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Processing;
            self.updated_at = Utc::now();
        }
    }

    /// Marks the job as completed
    pub fn mark_completed(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Completed;
            self.updated_at = Utc::now();
        }
    }

    /// Marks the job as failed
    ///
    /// `Failed` wins over `Completed` only if the job is not yet terminal.
    pub fn mark_failed(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Failed;
            self.updated_at = Utc::now();
        }
    }
}

/// Job request: the input contract from the upload/project layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Name for the output layer
    pub target_layer_name: String,

    /// Decoded feature array
    pub features: Vec<RawFeature>,

    /// Source reference frame of the feature coordinates
    pub source_crs: CrsId,

    /// Target reference frame; the configured canonical frame when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_crs: Option<CrsId>,

    /// Fixed batch size; 0 or absent selects the configured default
    #[serde(default)]
    pub batch_size: usize,

    /// Attribute carrying base elevation, when the caller knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_attribute: Option<String>,

    /// Attribute carrying object/extrusion height, when the caller knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_height_attribute: Option<String>,
}

/// Job result: the output contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Job identifier
    pub job_id: JobId,

    /// Terminal job status
    pub status: JobStatus,

    /// Created collection, absent when the job was rolled back
    pub collection_id: Option<CollectionId>,

    /// Created layer, absent when the job was rolled back
    pub layer_id: Option<LayerId>,

    /// Features persisted successfully
    pub imported_count: usize,

    /// Features that failed processing
    pub failed_count: usize,

    /// Features skipped before processing
    pub skipped_count: usize,

    /// Structured diagnostics
    pub debug_info: DebugInfo,
}

/// Result of an out-of-band height re-transformation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetransformOutcome {
    /// Features whose height transformation was re-attempted
    pub attempted: usize,

    /// Re-attempts that produced an ellipsoidal elevation
    pub completed: usize,

    /// Re-attempts that failed again
    pub failed: usize,
}
