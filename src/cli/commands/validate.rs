//! Validate-config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Executes the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid: {config_path}");
                println!("  Store target:  {:?}", config.store_target);
                println!("  Geodesy:       {}", config.geodesy.base_url);
                println!("  Canonical CRS: {}", config.import.canonical_crs);
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {e}");
                Ok(2)
            }
        }
    }
}
