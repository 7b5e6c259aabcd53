//! Logging and observability
//!
//! Structured logging with a console layer for development and an optional
//! JSON file layer with rotation.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
