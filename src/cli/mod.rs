//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Geolift - geospatial feature import & height-transformation pipeline
#[derive(Parser, Debug)]
#[command(name = "geolift")]
#[command(version, about, long_about = None)]
#[command(author = "Geolift Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "geolift.toml", env = "GEOLIFT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "GEOLIFT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import features from a job request file
    Import(commands::import::ImportArgs),

    /// Re-run height transformation for a layer
    Retransform(commands::retransform::RetransformArgs),

    /// Show import job status
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
