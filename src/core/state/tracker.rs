//! Job progress tracker
//!
//! Records job-level state transitions and feature counts through the
//! `JobStore` so external observers can follow or resume an import.
//! Terminal statuses are monotonic: once a job is completed or failed,
//! later updates never revert it to processing, which guards against
//! out-of-order batch-completion signals from a concurrent caller.

use crate::adapters::store::traits::JobStore;
use crate::domain::ids::{JobId, LayerId};
use crate::domain::job::{DebugInfo, ImportJob};
use crate::domain::{GeoliftError, Result};
use std::sync::Arc;

/// One progress update for a job
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub imported_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,

    /// Layer assignment, set once the container exists
    pub layer_id: Option<LayerId>,

    /// Diagnostics snapshot to persist alongside the counters
    pub debug_info: Option<DebugInfo>,

    /// Unrecoverable error; forces the job into `Failed`
    pub error: Option<String>,
}

/// Tracks import jobs in the job store
pub struct JobTracker {
    store: Arc<dyn JobStore>,
}

impl JobTracker {
    /// Creates a tracker backed by the given store
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Persists a new job and returns its id
    pub async fn create(&self, job: &ImportJob) -> Result<JobId> {
        let id = self.store.create_job(job).await?;
        tracing::info!(
            job_id = %id,
            layer_name = %job.layer_name,
            total_features = job.total_features,
            "Created import job"
        );
        Ok(id)
    }

    /// Applies a progress update and recomputes the job status
    ///
    /// The status becomes `Failed` on an unrecoverable error, `Completed`
    /// once every feature is accounted for, and `Processing` otherwise.
    /// Updates against a terminal job leave it unchanged.
    pub async fn update(&self, id: &JobId, update: JobUpdate) -> Result<ImportJob> {
        let mut job = self
            .store
            .get_job(id)
            .await?
            .ok_or_else(|| GeoliftError::Job(format!("unknown job {id}")))?;

        if job.status.is_terminal() {
            tracing::warn!(
                job_id = %id,
                status = ?job.status,
                "Ignoring update for terminal job"
            );
            return Ok(job);
        }

        job.imported_count = update.imported_count;
        job.failed_count = update.failed_count;
        job.skipped_count = update.skipped_count;
        if let Some(layer_id) = update.layer_id {
            job.layer_id = Some(layer_id);
        }
        if let Some(debug_info) = update.debug_info {
            job.debug_info = debug_info;
        }

        if let Some(error) = update.error {
            job.debug_info.notices.push(error);
            job.mark_failed();
        } else if job.accounted() >= job.total_features {
            job.mark_completed();
        } else {
            job.mark_processing();
        }

        self.store.update_job(&job).await?;

        tracing::debug!(
            job_id = %id,
            imported = job.imported_count,
            failed = job.failed_count,
            skipped = job.skipped_count,
            status = ?job.status,
            "Updated import job"
        );

        Ok(job)
    }

    /// Loads a job by id
    pub async fn get(&self, id: &JobId) -> Result<Option<ImportJob>> {
        self.store.get_job(id).await
    }

    /// Lists all jobs, most recent first
    pub async fn list(&self) -> Result<Vec<ImportJob>> {
        self.store.list_jobs().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::memory::MemoryStore;
    use crate::domain::job::JobStatus;

    fn tracker() -> JobTracker {
        JobTracker::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let tracker = tracker();
        let job = ImportJob::new("buildings", 4);
        let id = tracker.create(&job).await.unwrap();

        let loaded = tracker.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Started);
        assert_eq!(loaded.total_features, 4);
    }

    #[tokio::test]
    async fn test_partial_update_is_processing() {
        let tracker = tracker();
        let id = tracker.create(&ImportJob::new("buildings", 4)).await.unwrap();

        let job = tracker
            .update(
                &id,
                JobUpdate {
                    imported_count: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_full_account_completes() {
        let tracker = tracker();
        let id = tracker.create(&ImportJob::new("buildings", 4)).await.unwrap();

        let job = tracker
            .update(
                &id,
                JobUpdate {
                    imported_count: 2,
                    failed_count: 1,
                    skipped_count: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_error_forces_failed() {
        let tracker = tracker();
        let id = tracker.create(&ImportJob::new("buildings", 4)).await.unwrap();

        let job = tracker
            .update(
                &id,
                JobUpdate {
                    error: Some("job aborted: zero features imported".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.debug_info.notices.iter().any(|n| n.contains("aborted")));
    }

    #[tokio::test]
    async fn test_terminal_status_is_monotonic() {
        let tracker = tracker();
        let id = tracker.create(&ImportJob::new("buildings", 2)).await.unwrap();

        tracker
            .update(
                &id,
                JobUpdate {
                    imported_count: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // A late, out-of-order partial update must not revert the status.
        let job = tracker
            .update(
                &id,
                JobUpdate {
                    imported_count: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.imported_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_job_is_error() {
        let tracker = tracker();
        let err = tracker.update(&JobId::new(), JobUpdate::default()).await;
        assert!(err.is_err());
    }
}
