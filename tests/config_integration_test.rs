//! Configuration loading integration tests

use geolift::config::{load_config, StoreTarget};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file.flush().expect("flush config");
    file
}

#[test]
fn loads_a_minimal_configuration() {
    let file = write_config(
        r#"
store_target = "memory"

[geodesy]
base_url = "https://geodesy.example.org"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.store_target, StoreTarget::Memory);
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.import.default_batch_size, 500);
    assert_eq!(config.geodesy.height_endpoint, "reframe/lhn95tobessel");
}

#[test]
fn loads_a_full_configuration() {
    let file = write_config(
        r#"
store_target = "postgresql"

[application]
log_level = "debug"
dry_run = true

[import]
default_batch_size = 250
max_concurrent_transforms = 8
canonical_crs = "EPSG:4326"

[geodesy]
base_url = "https://geodesy.example.org"
timeout_seconds = 10

[geodesy.retry]
max_retries = 5

[postgresql]
connection_string = "host=localhost user=geolift dbname=geolift"
max_connections = 4

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.store_target, StoreTarget::PostgreSQL);
    assert!(config.application.dry_run);
    assert_eq!(config.import.default_batch_size, 250);
    assert_eq!(config.import.max_concurrent_transforms, 8);
    assert_eq!(config.geodesy.retry.max_retries, 5);
    assert_eq!(config.geodesy.retry.initial_delay_ms, 500);
    assert_eq!(
        config.postgresql.unwrap().connection_string,
        "host=localhost user=geolift dbname=geolift"
    );
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn substitutes_environment_variables() {
    std::env::set_var("GEOLIFT_IT_GEODESY_URL", "https://geodesy.example.org");

    let file = write_config(
        r#"
store_target = "memory"

[geodesy]
base_url = "${GEOLIFT_IT_GEODESY_URL}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.geodesy.base_url, "https://geodesy.example.org");

    std::env::remove_var("GEOLIFT_IT_GEODESY_URL");
}

#[test]
fn rejects_missing_environment_variables() {
    let file = write_config(
        r#"
store_target = "memory"

[geodesy]
base_url = "${GEOLIFT_IT_UNSET_VARIABLE}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("GEOLIFT_IT_UNSET_VARIABLE"));
}

#[test]
fn rejects_postgresql_target_without_section() {
    let file = write_config(
        r#"
store_target = "postgresql"

[geodesy]
base_url = "https://geodesy.example.org"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("postgresql"));
}

#[test]
fn rejects_invalid_values() {
    let file = write_config(
        r#"
store_target = "memory"

[application]
log_level = "loud"

[geodesy]
base_url = "https://geodesy.example.org"
"#,
    );

    assert!(load_config(file.path()).is_err());
}
