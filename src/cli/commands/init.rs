//! Init command implementation
//!
//! Writes a sample configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

const SAMPLE_CONFIG: &str = r#"# Geolift configuration

# Store target: "memory" or "postgresql"
store_target = "memory"

[application]
log_level = "info"
dry_run = false

[import]
default_batch_size = 500
max_concurrent_transforms = 4
canonical_crs = "EPSG:4326"

[geodesy]
base_url = "https://geodesy.geo.admin.ch"
height_endpoint = "reframe/lhn95tobessel"
position_endpoint = "reframe/lv95towgs84"
timeout_seconds = 30

[geodesy.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

# [postgresql]
# connection_string = "host=localhost user=geolift dbname=geolift password=${GEOLIFT_DB_PASSWORD}"
# max_connections = 8
# connection_timeout_seconds = 30

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "geolift.toml")]
    pub output: String,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    /// Executes the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let path = Path::new(&self.output);

        if path.exists() && !self.force {
            eprintln!(
                "{} already exists - use --force to overwrite",
                path.display()
            );
            return Ok(2);
        }

        fs::write(path, SAMPLE_CONFIG)?;
        println!("Wrote sample configuration to {}", path.display());
        println!("Edit it, then run: geolift validate-config");

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let config: crate::config::GeoliftConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.import.default_batch_size, 500);
    }
}
