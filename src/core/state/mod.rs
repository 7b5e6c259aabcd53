//! Job progress tracking

pub mod tracker;

pub use tracker::{JobTracker, JobUpdate};
