//! Import command implementation
//!
//! Runs one import job from a job-request JSON file.

use crate::cli::commands::build_coordinator;
use crate::config::load_config;
use crate::domain::job::{ImportRequest, JobStatus};
use clap::Args;
use std::fs;
use tokio::sync::watch;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the job request JSON file
    #[arg(value_name = "REQUEST")]
    pub request: String,

    /// Dry run mode - process features without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Override the target layer name
    #[arg(long)]
    pub layer: Option<String>,

    /// Override the batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the base-elevation attribute hint
    #[arg(long)]
    pub height_attribute: Option<String>,
}

impl ImportArgs {
    /// Executes the import command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(request = %self.request, "Starting import command");

        let config = load_config(config_path)?;

        let contents = fs::read_to_string(&self.request).map_err(|e| {
            anyhow::anyhow!("Failed to read request file {}: {}", self.request, e)
        })?;
        let mut request: ImportRequest = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse request file: {}", e))?;

        // CLI overrides
        if let Some(layer) = &self.layer {
            request.target_layer_name = layer.clone();
        }
        if let Some(batch_size) = self.batch_size {
            request.batch_size = batch_size;
        }
        if let Some(height_attribute) = &self.height_attribute {
            request.height_attribute = Some(height_attribute.clone());
        }
        if request.batch_size == 0 {
            request.batch_size = config.import.default_batch_size;
        }

        let dry_run = self.dry_run || config.application.dry_run;
        if dry_run {
            tracing::info!("Dry run mode enabled - no data will be written");
            println!("DRY RUN - no data will be written to the store");
        }

        let coordinator = build_coordinator(&config, dry_run).await?;
        let outcome = coordinator
            .execute_import(request, shutdown_signal)
            .await?;

        println!("Import job {}", outcome.job_id);
        println!("  Status:   {:?}", outcome.status);
        println!("  Imported: {}", outcome.imported_count);
        println!("  Failed:   {}", outcome.failed_count);
        println!("  Skipped:  {}", outcome.skipped_count);
        if let Some(layer_id) = outcome.layer_id {
            println!("  Layer:    {layer_id}");
        }
        if !outcome.debug_info.feature_errors.is_empty() {
            println!("  Feature errors:");
            for error in &outcome.debug_info.feature_errors {
                match &error.detail {
                    Some(detail) => {
                        println!("    #{}: {} ({})", error.index, error.message, detail)
                    }
                    None => println!("    #{}: {}", error.index, error.message),
                }
            }
        }

        let exit_code = match outcome.status {
            JobStatus::Failed => 4,
            _ => 0,
        };
        Ok(exit_code)
    }
}
