//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::GeoliftConfig;
use crate::domain::errors::GeoliftError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into GeoliftConfig
/// 4. Applies environment variable overrides (GEOLIFT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is not set, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<GeoliftConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GeoliftError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        GeoliftError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: GeoliftConfig = toml::from_str(&contents)
        .map_err(|e| GeoliftError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        GeoliftError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are passed through untouched so documentation examples
/// don't require the variables to exist.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex is valid");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let substituted = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing_vars.push(var_name.to_string());
                    String::new()
                }
            }
        });

        result.push_str(&substituted);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(GeoliftError::Configuration(format!(
            "Missing environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies GEOLIFT_* environment variable overrides
fn apply_env_overrides(config: &mut GeoliftConfig) {
    if let Ok(level) = std::env::var("GEOLIFT_LOG_LEVEL") {
        config.application.log_level = level;
    }

    if let Ok(base_url) = std::env::var("GEOLIFT_GEODESY_BASE_URL") {
        config.geodesy.base_url = base_url;
    }

    if let Ok(connection_string) = std::env::var("GEOLIFT_DATABASE_URL") {
        if let Some(ref mut postgresql) = config.postgresql {
            postgresql.connection_string = connection_string;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
store_target = "memory"

[geodesy]
base_url = "https://geodesy.example.org"
"#;

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/geolift.toml").unwrap_err();
        assert!(matches!(err, GeoliftError::Configuration(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_substitute_known_variable() {
        std::env::set_var("GEOLIFT_TEST_SUBST_VAR", "hello");
        let out = substitute_env_vars("value = \"${GEOLIFT_TEST_SUBST_VAR}\"").unwrap();
        assert!(out.contains("hello"));
        std::env::remove_var("GEOLIFT_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_missing_variable_errors() {
        let err = substitute_env_vars("value = \"${GEOLIFT_TEST_MISSING_VAR}\"").unwrap_err();
        assert!(err.to_string().contains("GEOLIFT_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_comment_lines_are_skipped() {
        let out = substitute_env_vars("# value = \"${GEOLIFT_TEST_MISSING_VAR}\"").unwrap();
        assert!(out.contains("GEOLIFT_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_minimal_config_parses() {
        let config: GeoliftConfig = toml::from_str(MINIMAL).unwrap();
        assert!(config.validate().is_ok());
    }
}
