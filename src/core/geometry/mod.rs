//! Geometry validation and repair

pub mod validate;

pub use validate::{validate_and_repair, GeometryProvenance, ValidatedGeometry};
