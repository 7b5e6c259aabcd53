//! Per-feature preparation
//!
//! The CPU-bound half of the pipeline: geometry parsing, validation and
//! repair, footprint reprojection, and height resolution. Everything here
//! is synchronous and fails per feature into a typed outcome; the
//! orchestrator turns those outcomes into counters and diagnostics.

use crate::core::geometry::{validate_and_repair, GeometryProvenance};
use crate::core::height::{HeightResolver, ResolvedHeight};
use crate::core::reproject::Reprojector;
use crate::domain::feature::RawFeature;
use crate::domain::geometry::RawGeometry;
use crate::domain::ids::CrsId;
use crate::domain::job::FeatureError;
use geo::algorithm::{Centroid, CoordsIter};
use geo_types::{Coord, Geometry};
use serde_json::{json, Map, Value};

/// A feature that passed the CPU-bound stages and awaits datum resolution
#[derive(Debug)]
pub struct PreparedFeature {
    /// Index in the input feature array
    pub index: usize,

    /// Footprint in the canonical target frame
    pub footprint: Geometry<f64>,

    /// Representative horizontal point in the source frame
    pub source_point: Coord<f64>,

    /// Resolved base height, if any source produced one
    pub resolved_height: Option<ResolvedHeight>,

    /// Object/extrusion height from the caller-designated attribute
    pub object_height: Option<f64>,

    /// Attributes augmented with preserved source coordinates
    pub attributes: Map<String, Value>,

    /// Per-feature notices collected during preparation
    pub notices: Vec<String>,
}

/// Outcome of preparing one feature
#[derive(Debug)]
pub enum PreparedOutcome {
    /// No or unparsable geometry; not processed at all
    Skipped { error: FeatureError },

    /// Processing failed (invalid geometry, reprojection failure)
    Failed { error: FeatureError },

    /// Ready for datum resolution and persistence
    Prepared(Box<PreparedFeature>),
}

/// Runs the CPU-bound per-feature stages for one import job
pub struct FeatureProcessor {
    source_crs: CrsId,
    reprojector: Reprojector,
    resolver: HeightResolver,
    object_height_attribute: Option<String>,
}

impl FeatureProcessor {
    /// Creates a processor for a job's frame pair and height hints
    pub fn new(
        source_crs: CrsId,
        target_crs: CrsId,
        height_attribute: Option<String>,
        object_height_attribute: Option<String>,
    ) -> Self {
        let reprojector = Reprojector::new(source_crs.clone(), target_crs);
        Self {
            source_crs,
            reprojector,
            resolver: HeightResolver::new(height_attribute),
            object_height_attribute,
        }
    }

    /// Prepares one feature: parse, validate/repair, reproject, resolve height
    pub fn prepare(&self, index: usize, feature: &RawFeature) -> PreparedOutcome {
        let mut notices = Vec::new();

        let Some(geometry_value) = feature.geometry.as_ref().filter(|v| !v.is_null()) else {
            return PreparedOutcome::Skipped {
                error: FeatureError::new(index, "feature has no geometry object"),
            };
        };

        let raw_geometry = match RawGeometry::from_value(geometry_value) {
            Ok(g) => g,
            Err(e) => {
                return PreparedOutcome::Skipped {
                    error: FeatureError::new(index, e.to_string()),
                };
            }
        };

        let validated = match validate_and_repair(&raw_geometry.to_geo()) {
            Ok(v) => v,
            Err(e) => {
                let detail = match &e {
                    crate::domain::errors::PipelineError::GeometryInvalid { reason } => {
                        Some(reason.clone())
                    }
                    _ => None,
                };
                let mut error = FeatureError::new(index, "geometry is invalid beyond repair");
                if let Some(detail) = detail {
                    error = error.with_detail(detail);
                }
                return PreparedOutcome::Failed { error };
            }
        };

        match validated.provenance {
            GeometryProvenance::Repaired => {
                notices.push(format!("feature {index}: geometry repaired"));
            }
            GeometryProvenance::VertexDeduplicated => {
                notices.push(format!("feature {index}: duplicate vertices removed"));
            }
            GeometryProvenance::Unchanged => {}
        }

        let source_point = representative_point(&validated.geometry);

        let resolved_height =
            self.resolver
                .resolve(&raw_geometry, &feature.properties, &mut notices);

        let footprint = match self.reprojector.transform(&validated.geometry) {
            Ok(g) => g,
            Err(e) => {
                return PreparedOutcome::Failed {
                    error: FeatureError::new(index, e.to_string()),
                };
            }
        };

        let object_height = self.object_height(index, &feature.properties, &mut notices);

        let attributes = self.augment_attributes(
            feature.properties.clone(),
            source_point,
            resolved_height.as_ref(),
        );

        PreparedOutcome::Prepared(Box::new(PreparedFeature {
            index,
            footprint,
            source_point,
            resolved_height,
            object_height,
            attributes,
            notices,
        }))
    }

    fn object_height(
        &self,
        index: usize,
        properties: &Map<String, Value>,
        notices: &mut Vec<String>,
    ) -> Option<f64> {
        let name = self.object_height_attribute.as_ref()?;
        let value = properties.get(name)?;

        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed.filter(|v| v.is_finite()) {
            Some(v) => Some(v),
            None => {
                notices.push(format!(
                    "feature {index}: object height attribute '{name}' is not numeric"
                ));
                None
            }
        }
    }

    /// Preserves the source frame and representative coordinates on the
    /// attribute map so a later re-transformation pass can re-resolve
    /// heights without the original input.
    fn augment_attributes(
        &self,
        mut attributes: Map<String, Value>,
        source_point: Coord<f64>,
        resolved_height: Option<&ResolvedHeight>,
    ) -> Map<String, Value> {
        attributes.insert(
            "_source_crs".to_string(),
            Value::String(self.source_crs.authority_string()),
        );
        attributes.insert(
            "_source_coordinates".to_string(),
            json!([source_point.x, source_point.y]),
        );
        if let Some(height) = resolved_height {
            attributes.insert("_source_height".to_string(), json!(height.value));
        }
        attributes
    }
}

/// Representative horizontal point of a geometry
///
/// The centroid when it exists, otherwise the first coordinate.
pub fn representative_point(geometry: &Geometry<f64>) -> Coord<f64> {
    geometry
        .centroid()
        .map(|p| p.0)
        .or_else(|| geometry.coords_iter().next())
        .unwrap_or(Coord { x: 0.0, y: 0.0 })
}
