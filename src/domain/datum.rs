//! Vertical datum reference data
//!
//! Maps a reference-frame identifier to the vertical datum its heights are
//! referenced to and the transformation method required to lift them onto
//! the canonical ellipsoid. Read-only reference data; never mutated by the
//! pipeline.

use crate::domain::ids::CrsId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of reference surface a height system is defined against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatumType {
    /// Heights above a reference ellipsoid
    Ellipsoidal,
    /// Heights above a gravity-based geoid/mean-sea-level surface
    Orthometric,
    /// Heights above a geoid model
    Geoidal,
    /// Anything else
    Other,
}

/// How heights in a datum are converted to canonical ellipsoidal heights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMethod {
    /// Heights are already ellipsoidal; use them directly
    None,
    /// Two-call resolution via the external geodesy service
    GeodesyService,
}

/// One vertical datum lookup entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerticalDatumReference {
    /// Name of the datum, e.g. "LN02" or "WGS84 ellipsoid"
    pub datum_name: String,

    /// Reference surface kind
    pub datum_type: DatumType,

    /// Conversion method
    pub method: TransformMethod,
}

impl VerticalDatumReference {
    fn new(datum_name: &str, datum_type: DatumType, method: TransformMethod) -> Self {
        Self {
            datum_name: datum_name.to_string(),
            datum_type,
            method,
        }
    }

    /// Whether heights in this datum need the external geodesy service
    pub fn needs_service(&self) -> bool {
        self.method == TransformMethod::GeodesyService
    }
}

/// Registry of vertical datum references
///
/// Lookup resolves an exact reference-frame match first, then falls back to
/// numeric EPSG-code ranges. Range entries cover families of codes (e.g.
/// vertical CRS codes of national levelling networks) that share a datum.
#[derive(Debug, Clone, Default)]
pub struct DatumRegistry {
    exact: HashMap<String, VerticalDatumReference>,
    ranges: Vec<(u32, u32, VerticalDatumReference)>,
}

impl DatumRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in entries
    ///
    /// Exact entries cover the frames the pipeline is routinely fed with;
    /// the range entry catches national vertical datum codes that all
    /// resolve through the geodesy service.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.insert_exact(
            "EPSG:2056",
            VerticalDatumReference::new("LN02", DatumType::Orthometric, TransformMethod::GeodesyService),
        );
        registry.insert_exact(
            "EPSG:21781",
            VerticalDatumReference::new("LN02", DatumType::Orthometric, TransformMethod::GeodesyService),
        );
        registry.insert_exact(
            "EPSG:4326",
            VerticalDatumReference::new("WGS84 ellipsoid", DatumType::Ellipsoidal, TransformMethod::None),
        );
        registry.insert_exact(
            "EPSG:4979",
            VerticalDatumReference::new("WGS84 ellipsoid", DatumType::Ellipsoidal, TransformMethod::None),
        );
        registry.insert_exact(
            "EPSG:3857",
            VerticalDatumReference::new("WGS84 ellipsoid", DatumType::Ellipsoidal, TransformMethod::None),
        );
        registry.insert_range(
            5700,
            5799,
            VerticalDatumReference::new(
                "national levelling network",
                DatumType::Orthometric,
                TransformMethod::GeodesyService,
            ),
        );

        registry
    }

    /// Adds an exact-match entry, replacing any existing one
    pub fn insert_exact(&mut self, crs: &str, reference: VerticalDatumReference) {
        self.exact.insert(normalize(crs), reference);
    }

    /// Adds a numeric-range fallback entry (inclusive bounds)
    pub fn insert_range(&mut self, from: u32, to: u32, reference: VerticalDatumReference) {
        self.ranges.push((from, to, reference));
    }

    /// Resolves the vertical datum for a reference frame
    ///
    /// Exact matches win; otherwise the first range containing the numeric
    /// EPSG code applies (ranges are checked in insertion order, making the
    /// fallback deterministic).
    pub fn lookup(&self, crs: &CrsId) -> Option<&VerticalDatumReference> {
        if let Some(reference) = self.exact.get(&normalize(crs.as_str())) {
            return Some(reference);
        }

        let code = crs.epsg_code()?;
        self.ranges
            .iter()
            .find(|(from, to, _)| (*from..=*to).contains(&code))
            .map(|(_, _, reference)| reference)
    }
}

fn normalize(crs: &str) -> String {
    match CrsId::new(crs) {
        Ok(id) => id.authority_string().to_uppercase(),
        Err(_) => crs.to_uppercase(),
    }
}
