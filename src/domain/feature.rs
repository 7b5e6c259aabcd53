//! Feature models
//!
//! `RawFeature` is the immutable input unit supplied by the caller;
//! `StoredFeature` is the persisted, normalized output row.

use crate::domain::errors::GeoliftError;
use crate::domain::ids::{FeatureId, LayerId};
use chrono::{DateTime, Utc};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input feature: a nullable GeoJSON-shaped geometry plus attributes
///
/// The geometry is kept as raw JSON here so a single malformed feature
/// fails at the per-feature boundary instead of aborting deserialization
/// of the whole request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFeature {
    /// GeoJSON-shaped geometry object, absent or null for degenerate input
    #[serde(default)]
    pub geometry: Option<Value>,

    /// Attribute map
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl RawFeature {
    /// Whether the input carries a usable geometry object
    pub fn has_geometry(&self) -> bool {
        self.geometry.as_ref().is_some_and(|g| !g.is_null())
    }
}

/// How a feature's height values are to be interpreted by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightMode {
    /// Base elevation is an ellipsoidal height in the canonical frame
    AbsoluteEllipsoidal,
    /// No usable height; consumers drape the feature on terrain
    ClampToGround,
    /// Heights are offsets above local ground
    RelativeToGround,
    /// The source LV95/local orthometric height is stored untransformed
    Lv95Stored,
    /// The vertical reference could not be determined
    Unknown,
}

impl Default for HeightMode {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Lifecycle of the vertical datum transformation for one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightTransformationStatus {
    /// Not yet attempted
    Pending,
    /// Currently being transformed
    Processing,
    /// Transformed; base elevation is set
    Complete,
    /// Transformation failed; base elevation is null and an error is recorded
    Failed,
    /// No height source exists for this feature
    NotRequired,
}

/// Persisted output feature
///
/// The footprint is immutable after creation; height fields may be mutated
/// later by an out-of-band re-transformation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFeature {
    /// Row identifier
    pub id: FeatureId,

    /// Owning layer
    pub layer_id: LayerId,

    /// 2D footprint in the canonical horizontal frame
    pub footprint: Geometry<f64>,

    /// Ellipsoidal base elevation in the canonical frame, if resolved
    pub base_elevation_ellipsoidal: Option<f64>,

    /// Object/extrusion height, if the caller designated an attribute for it
    pub object_height: Option<f64>,

    /// Interpretation of the height fields
    pub height_mode: HeightMode,

    /// Provenance of the resolved height, e.g. "z_coord" or "attribute:H_MEAN"
    pub height_source: Option<String>,

    /// Name of the vertical datum the source height was referenced to
    pub vertical_datum_source: Option<String>,

    /// Transformation lifecycle status
    pub height_transformation_status: HeightTransformationStatus,

    /// Error recorded when the transformation failed
    pub height_transformation_error: Option<String>,

    /// Original attributes, augmented with preserved source coordinates
    pub attributes: Map<String, Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Builder for `StoredFeature`
///
/// Starts from the mandatory layer/footprint pair; height fields default to
/// the "no height" terminal state and are filled in by the pipeline.
pub struct StoredFeatureBuilder {
    layer_id: LayerId,
    footprint: Geometry<f64>,
    base_elevation_ellipsoidal: Option<f64>,
    object_height: Option<f64>,
    height_mode: HeightMode,
    height_source: Option<String>,
    vertical_datum_source: Option<String>,
    height_transformation_status: HeightTransformationStatus,
    height_transformation_error: Option<String>,
    attributes: Map<String, Value>,
}

impl StoredFeatureBuilder {
    /// Creates a builder for a feature in the given layer
    pub fn new(layer_id: LayerId, footprint: Geometry<f64>) -> Self {
        Self {
            layer_id,
            footprint,
            base_elevation_ellipsoidal: None,
            object_height: None,
            height_mode: HeightMode::ClampToGround,
            height_source: None,
            vertical_datum_source: None,
            height_transformation_status: HeightTransformationStatus::NotRequired,
            height_transformation_error: None,
            attributes: Map::new(),
        }
    }

    /// Sets the resolved ellipsoidal base elevation
    pub fn base_elevation(mut self, elevation: f64) -> Self {
        self.base_elevation_ellipsoidal = Some(elevation);
        self
    }

    /// Sets the object/extrusion height
    pub fn object_height(mut self, height: f64) -> Self {
        self.object_height = Some(height);
        self
    }

    /// Sets the height mode
    pub fn height_mode(mut self, mode: HeightMode) -> Self {
        self.height_mode = mode;
        self
    }

    /// Sets the height provenance tag
    pub fn height_source(mut self, source: impl Into<String>) -> Self {
        self.height_source = Some(source.into());
        self
    }

    /// Sets the vertical datum name
    pub fn vertical_datum_source(mut self, datum: impl Into<String>) -> Self {
        self.vertical_datum_source = Some(datum.into());
        self
    }

    /// Sets the transformation status
    pub fn transformation_status(mut self, status: HeightTransformationStatus) -> Self {
        self.height_transformation_status = status;
        self
    }

    /// Records a transformation error message
    pub fn transformation_error(mut self, message: impl Into<String>) -> Self {
        self.height_transformation_error = Some(message.into());
        self
    }

    /// Sets the attribute map
    pub fn attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builds the feature, enforcing the status invariants
    ///
    /// # Errors
    ///
    /// Returns a validation error if `Complete` is set without a base
    /// elevation, or `Failed` with one.
    pub fn build(self) -> Result<StoredFeature, GeoliftError> {
        match self.height_transformation_status {
            HeightTransformationStatus::Complete if self.base_elevation_ellipsoidal.is_none() => {
                return Err(GeoliftError::Validation(
                    "complete height transformation requires a base elevation".to_string(),
                ));
            }
            HeightTransformationStatus::Failed if self.base_elevation_ellipsoidal.is_some() => {
                return Err(GeoliftError::Validation(
                    "failed height transformation must leave base elevation null".to_string(),
                ));
            }
            HeightTransformationStatus::Failed if self.height_transformation_error.is_none() => {
                return Err(GeoliftError::Validation(
                    "failed height transformation requires an error message".to_string(),
                ));
            }
            _ => {}
        }

        Ok(StoredFeature {
            id: FeatureId::new(),
            layer_id: self.layer_id,
            footprint: self.footprint,
            base_elevation_ellipsoidal: self.base_elevation_ellipsoidal,
            object_height: self.object_height,
            height_mode: self.height_mode,
            height_source: self.height_source,
            vertical_datum_source: self.vertical_datum_source,
            height_transformation_status: self.height_transformation_status,
            height_transformation_error: self.height_transformation_error,
            attributes: self.attributes,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;
    use serde_json::json;

    fn footprint() -> Geometry<f64> {
        Geometry::Point(Point::new(7.45, 46.95))
    }

    #[test]
    fn test_raw_feature_null_geometry() {
        let feature: RawFeature = serde_json::from_value(json!({
            "geometry": null,
            "properties": {"name": "a"}
        }))
        .unwrap();
        assert!(!feature.has_geometry());

        let feature: RawFeature = serde_json::from_value(json!({
            "properties": {}
        }))
        .unwrap();
        assert!(!feature.has_geometry());
    }

    #[test]
    fn test_builder_complete_requires_elevation() {
        let err = StoredFeatureBuilder::new(LayerId::new(), footprint())
            .transformation_status(HeightTransformationStatus::Complete)
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoliftError::Validation(_)));
    }

    #[test]
    fn test_builder_failed_requires_null_elevation() {
        let err = StoredFeatureBuilder::new(LayerId::new(), footprint())
            .base_elevation(566.1)
            .transformation_status(HeightTransformationStatus::Failed)
            .transformation_error("timeout")
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoliftError::Validation(_)));
    }

    #[test]
    fn test_builder_failed_requires_message() {
        let err = StoredFeatureBuilder::new(LayerId::new(), footprint())
            .transformation_status(HeightTransformationStatus::Failed)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("error message"));
    }

    #[test]
    fn test_builder_complete_feature() {
        let feature = StoredFeatureBuilder::new(LayerId::new(), footprint())
            .base_elevation(566.1)
            .height_mode(HeightMode::AbsoluteEllipsoidal)
            .height_source("z_coord")
            .vertical_datum_source("LN02")
            .transformation_status(HeightTransformationStatus::Complete)
            .build()
            .unwrap();

        assert_eq!(feature.base_elevation_ellipsoidal, Some(566.1));
        assert_eq!(feature.height_mode, HeightMode::AbsoluteEllipsoidal);
        assert_eq!(feature.height_source.as_deref(), Some("z_coord"));
    }

    #[test]
    fn test_status_serialization_is_snake_case() {
        let json = serde_json::to_string(&HeightTransformationStatus::NotRequired).unwrap();
        assert_eq!(json, "\"not_required\"");
        let json = serde_json::to_string(&HeightMode::AbsoluteEllipsoidal).unwrap();
        assert_eq!(json, "\"absolute_ellipsoidal\"");
    }

    #[test]
    fn test_stored_feature_roundtrip() {
        let feature = StoredFeatureBuilder::new(LayerId::new(), footprint())
            .attributes(json!({"H_MEAN": 612.3}).as_object().unwrap().clone())
            .build()
            .unwrap();

        let json = serde_json::to_string(&feature).unwrap();
        let back: StoredFeature = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, feature.id);
        assert_eq!(back.attributes, feature.attributes);
        assert_eq!(
            back.height_transformation_status,
            HeightTransformationStatus::NotRequired
        );
    }
}
