//! Configuration management
//!
//! TOML configuration with `${VAR}` environment substitution and
//! `GEOLIFT_*` overrides.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, GeodesyConfig, GeoliftConfig, ImportConfig, LoggingConfig,
    PostgreSQLConfig, RetryConfig, StoreTarget,
};
