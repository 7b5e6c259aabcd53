//! Retransform command implementation
//!
//! Re-runs the vertical datum transformation for a layer's features whose
//! height transformation is pending or failed.

use crate::cli::commands::build_coordinator;
use crate::config::load_config;
use crate::domain::ids::{CrsId, LayerId};
use clap::Args;
use std::str::FromStr;

/// Arguments for the retransform command
#[derive(Args, Debug)]
pub struct RetransformArgs {
    /// Layer whose features should be re-transformed
    #[arg(long, value_name = "LAYER_ID")]
    pub layer_id: String,

    /// Source reference frame the layer was imported from
    #[arg(long, value_name = "CRS")]
    pub source_crs: String,
}

impl RetransformArgs {
    /// Executes the retransform command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;

        let layer_id = LayerId::from_str(&self.layer_id)
            .map_err(|e| anyhow::anyhow!("Invalid layer id: {}", e))?;
        let source_crs = CrsId::from_str(&self.source_crs)
            .map_err(|e| anyhow::anyhow!("Invalid source CRS: {}", e))?;

        let coordinator = build_coordinator(&config, false).await?;
        let outcome = coordinator.retransform_layer(&layer_id, &source_crs).await?;

        println!("Height re-transformation for layer {layer_id}");
        println!("  Attempted: {}", outcome.attempted);
        println!("  Completed: {}", outcome.completed);
        println!("  Failed:    {}", outcome.failed);

        Ok(0)
    }
}
