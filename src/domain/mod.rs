//! Domain models and types for Geolift.
//!
//! This module contains the core domain models, types, and business rules:
//!
//! - **Strongly-typed identifiers** ([`CollectionId`], [`LayerId`],
//!   [`FeatureId`], [`JobId`], [`CrsId`])
//! - **Feature models** ([`RawFeature`], [`StoredFeature`], [`RawGeometry`])
//! - **Job models** ([`ImportJob`], [`ImportRequest`], [`ImportOutcome`])
//! - **Vertical datum reference data** ([`DatumRegistry`])
//! - **Error types** ([`GeoliftError`] and its sub-hierarchies)
//! - **Result type alias** ([`Result`])
//!
//! Identifiers use the newtype pattern so different id kinds cannot be
//! mixed, and all fallible operations return [`Result<T>`].

pub mod datum;
pub mod errors;
pub mod feature;
pub mod geometry;
pub mod ids;
pub mod job;
pub mod result;

// Re-export commonly used types for convenience
pub use datum::{DatumRegistry, DatumType, TransformMethod, VerticalDatumReference};
pub use errors::{GeodesyError, GeoliftError, PipelineError, StoreError};
pub use feature::{
    HeightMode, HeightTransformationStatus, RawFeature, StoredFeature, StoredFeatureBuilder,
};
pub use geometry::{RawGeometry, RawPosition};
pub use ids::{CollectionId, CrsId, FeatureId, JobId, LayerId};
pub use job::{
    DebugInfo, FeatureError, ImportJob, ImportOutcome, ImportRequest, JobStatus,
    RetransformOutcome,
};
pub use result::Result;
