//! Status command implementation
//!
//! Lists import jobs with their counters and status.

use crate::adapters::store::{create_stores, JobStore};
use crate::config::load_config;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show only the most recent N jobs
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl StatusArgs {
    /// Executes the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let (_, job_store) = create_stores(&config).await?;

        let jobs = job_store.list_jobs().await?;

        if jobs.is_empty() {
            println!("No import jobs found");
            return Ok(0);
        }

        println!(
            "{:<38} {:<12} {:>8} {:>8} {:>8} {:>8}  {}",
            "JOB", "STATUS", "TOTAL", "IMPORTED", "FAILED", "SKIPPED", "LAYER"
        );
        for job in jobs.iter().take(self.limit) {
            println!(
                "{:<38} {:<12} {:>8} {:>8} {:>8} {:>8}  {}",
                job.id.to_string(),
                format!("{:?}", job.status).to_lowercase(),
                job.total_features,
                job.imported_count,
                job.failed_count,
                job.skipped_count,
                job.layer_name,
            );
        }

        Ok(0)
    }
}
