//! Domain error types
//!
//! This module defines the error hierarchy for Geolift. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Geolift error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum GeoliftError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Per-feature pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Geodesy transformation service errors
    #[error("Geodesy service error: {0}")]
    Geodesy(#[from] GeodesyError),

    /// Feature/job store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Job bookkeeping errors
    #[error("Job error: {0}")]
    Job(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Per-feature pipeline errors
///
/// These errors are caught at the feature boundary and converted into
/// diagnostic entries; they never propagate past the batch orchestrator
/// except via the aggregate zero-imported rule.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input geometry could not be parsed (malformed coordinates, unsupported type)
    #[error("Failed to parse geometry: {0}")]
    GeometryParseFailed(String),

    /// Geometry is topologically invalid and could not be repaired
    #[error("Invalid geometry: {reason}")]
    GeometryInvalid { reason: String },

    /// Horizontal reprojection failed
    #[error("Reprojection failed: {0}")]
    ReprojectionFailed(String),

    /// Vertical datum transformation via the geodesy service failed
    #[error("Height transformation failed: {0}")]
    HeightTransformFailed(String),

    /// Zero features imported while at least one was attempted
    #[error("Job aborted: {0}")]
    JobAborted(String),
}

/// Geodesy transformation service errors
///
/// Errors that occur when calling the external height-transformation
/// endpoints. These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum GeodesyError {
    /// Failed to connect to the geodesy service
    #[error("Failed to connect to geodesy service: {0}")]
    ConnectionFailed(String),

    /// Request deadline expired
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body could not be parsed
    #[error("Invalid response from geodesy service: {0}")]
    InvalidResponse(String),

    /// A required numeric field was missing or non-finite
    #[error("Missing or non-numeric field in response: {0}")]
    MissingField(String),
}

impl GeodesyError {
    /// Whether a retry may succeed for this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeodesyError::ConnectionFailed(_)
                | GeodesyError::Timeout(_)
                | GeodesyError::ServerError { .. }
        )
    }
}

/// Feature/job store errors
///
/// Errors that occur when interacting with the spatial data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to insert a row
    #[error("Insert failed: {0}")]
    InsertFailed(String),

    /// Failed to update a row
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// Failed to delete rows
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// Failed to query rows
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Failed to (de)serialize a stored value
    #[error("Store serialization failed: {0}")]
    Serialization(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for GeoliftError {
    fn from(err: std::io::Error) -> Self {
        GeoliftError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for GeoliftError {
    fn from(err: serde_json::Error) -> Self {
        GeoliftError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for GeoliftError {
    fn from(err: toml::de::Error) -> Self {
        GeoliftError::Configuration(format!("TOML parse error: {err}"))
    }
}
