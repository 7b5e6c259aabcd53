//! Import summary and reporting
//!
//! Accumulates counters and structured diagnostics over a whole job. The
//! summary is an explicit value passed through the processing calls, never
//! ambient state.

use crate::domain::job::{DebugInfo, FeatureError};
use std::time::Duration;

/// Aggregate result of an import job
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Features persisted successfully
    pub imported: usize,

    /// Features that failed processing
    pub failed: usize,

    /// Features skipped before processing
    pub skipped: usize,

    /// Informational notices in processing order
    pub notices: Vec<String>,

    /// Per-feature errors in processing order
    pub feature_errors: Vec<FeatureError>,

    /// Duration of the import
    pub duration: Duration,
}

impl ImportSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of features accounted for
    pub fn accounted(&self) -> usize {
        self.imported + self.failed + self.skipped
    }

    /// Number of features that went through actual processing
    pub fn attempted(&self) -> usize {
        self.imported + self.failed
    }

    /// Adds an informational notice
    pub fn notice(&mut self, notice: impl Into<String>) {
        self.notices.push(notice.into());
    }

    /// Merges a batch outcome into this summary
    pub fn merge(&mut self, other: ImportSummary) {
        self.imported += other.imported;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.notices.extend(other.notices);
        self.feature_errors.extend(other.feature_errors);
    }

    /// Converts the diagnostics into the persisted form
    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            notices: self.notices.clone(),
            feature_errors: self.feature_errors.clone(),
        }
    }

    /// Logs the summary
    pub fn log_summary(&self) {
        tracing::info!(
            imported = self.imported,
            failed = self.failed,
            skipped = self.skipped,
            notices = self.notices.len(),
            duration_secs = self.duration.as_secs(),
            "Import completed"
        );

        if !self.feature_errors.is_empty() {
            tracing::warn!(
                error_count = self.feature_errors.len(),
                "Import completed with feature errors"
            );
            for error in &self.feature_errors {
                tracing::warn!(
                    index = error.index,
                    message = %error.message,
                    detail = error.detail.as_deref().unwrap_or(""),
                    "Feature error"
                );
            }
        }
    }
}
