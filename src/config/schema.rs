//! Configuration schema types
//!
//! This module defines the configuration structure for Geolift, mapping
//! one-to-one onto the TOML file.

use serde::{Deserialize, Serialize};

/// Store target selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreTarget {
    /// In-memory store (tests, dry runs, single-shot imports)
    Memory,
    /// PostgreSQL database
    PostgreSQL,
}

/// Main Geolift configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoliftConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Import pipeline settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Geodesy transformation service
    pub geodesy: GeodesyConfig,

    /// Store target (memory or postgresql)
    pub store_target: StoreTarget,

    /// PostgreSQL configuration (required if store_target = postgresql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgresql: Option<PostgreSQLConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GeoliftConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.import.validate()?;
        self.geodesy.validate()?;

        // Only the active store configuration is validated; both may be
        // present in the TOML file.
        if self.store_target == StoreTarget::PostgreSQL {
            match &self.postgresql {
                Some(config) => config.validate()?,
                None => {
                    return Err(
                        "postgresql configuration is required when store_target = 'postgresql'"
                            .to_string(),
                    )
                }
            }
        }

        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (process features but don't write to the store)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Import pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Batch size used when a request does not specify one
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Bound on concurrent outstanding geodesy-service calls per batch
    #[serde(default = "default_max_concurrent_transforms")]
    pub max_concurrent_transforms: usize,

    /// Canonical horizontal frame features are reprojected into
    #[serde(default = "default_canonical_crs")]
    pub canonical_crs: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            max_concurrent_transforms: default_max_concurrent_transforms(),
            canonical_crs: default_canonical_crs(),
        }
    }
}

impl ImportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_batch_size == 0 {
            return Err("default_batch_size must be at least 1".to_string());
        }
        if self.max_concurrent_transforms == 0 {
            return Err("max_concurrent_transforms must be at least 1".to_string());
        }
        if self.canonical_crs.trim().is_empty() {
            return Err("canonical_crs cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Retry configuration for geodesy-service calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Geodesy transformation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeodesyConfig {
    /// Base URL of the service
    #[serde(default = "default_geodesy_base_url")]
    pub base_url: String,

    /// Endpoint converting a local orthometric height to an intermediate
    /// ellipsoidal height
    #[serde(default = "default_height_endpoint")]
    pub height_endpoint: String,

    /// Endpoint converting a position plus intermediate height into the
    /// canonical global frame
    #[serde(default = "default_position_endpoint")]
    pub position_endpoint: String,

    /// Per-call deadline in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry behavior on transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for GeodesyConfig {
    fn default() -> Self {
        Self {
            base_url: default_geodesy_base_url(),
            height_endpoint: default_height_endpoint(),
            position_endpoint: default_position_endpoint(),
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

impl GeodesyConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("geodesy base_url cannot be empty".to_string());
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!("geodesy base_url is not a valid URL: {}", self.base_url));
        }
        if self.timeout_seconds == 0 {
            return Err("geodesy timeout_seconds must be at least 1".to_string());
        }
        if self.retry.max_retries == 0 {
            return Err("geodesy retry.max_retries must be at least 1".to_string());
        }
        Ok(())
    }
}

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgreSQLConfig {
    /// Connection string, e.g. "host=localhost user=geolift dbname=geolift"
    pub connection_string: String,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Pool wait/create timeout in seconds
    #[serde(default = "default_connection_timeout_seconds")]
    pub connection_timeout_seconds: u64,
}

impl PostgreSQLConfig {
    fn validate(&self) -> Result<(), String> {
        if self.connection_string.trim().is_empty() {
            return Err("postgresql connection_string cannot be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("postgresql max_connections must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy (daily or hourly)
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if !["daily", "hourly"].contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be 'daily' or 'hourly'",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_max_concurrent_transforms() -> usize {
    4
}

fn default_canonical_crs() -> String {
    "EPSG:4326".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_geodesy_base_url() -> String {
    "https://geodesy.geo.admin.ch".to_string()
}

fn default_height_endpoint() -> String {
    "reframe/lhn95tobessel".to_string()
}

fn default_position_endpoint() -> String {
    "reframe/lv95towgs84".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_connections() -> usize {
    8
}

fn default_connection_timeout_seconds() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GeoliftConfig {
        GeoliftConfig {
            application: ApplicationConfig::default(),
            import: ImportConfig::default(),
            geodesy: GeodesyConfig::default(),
            store_target: StoreTarget::Memory,
            postgresql: None,
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = valid_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgresql_target_requires_config() {
        let mut config = valid_config();
        config.store_target = StoreTarget::PostgreSQL;
        assert!(config.validate().is_err());

        config.postgresql = Some(PostgreSQLConfig {
            connection_string: "host=localhost user=geolift dbname=geolift".to_string(),
            max_connections: default_max_connections(),
            connection_timeout_seconds: default_connection_timeout_seconds(),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = valid_config();
        config.import.default_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_geodesy_url_rejected() {
        let mut config = valid_config();
        config.geodesy.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rotation_rejected() {
        let mut config = valid_config();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_target_deserialization() {
        let target: StoreTarget = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(target, StoreTarget::PostgreSQL);
        let target: StoreTarget = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(target, StoreTarget::Memory);
    }

    #[test]
    fn test_minimal_toml_with_defaults() {
        let config: GeoliftConfig = toml::from_str(
            r#"
            store_target = "memory"

            [geodesy]
            base_url = "https://geodesy.example.org"
            "#,
        )
        .unwrap();

        assert_eq!(config.import.default_batch_size, 500);
        assert_eq!(config.geodesy.retry.max_retries, 3);
        assert_eq!(config.geodesy.height_endpoint, "reframe/lhn95tobessel");
        assert!(config.validate().is_ok());
    }
}
