//! Batch import orchestration

pub mod batch;
pub mod coordinator;
pub mod summary;

pub use batch::{FeatureProcessor, PreparedFeature, PreparedOutcome};
pub use coordinator::ImportCoordinator;
pub use summary::ImportSummary;
