//! Row mapping for the PostgreSQL store
//!
//! Converts between domain types and their column representations:
//! geometries travel as WKT text, enums as their snake_case serde names,
//! diagnostics as JSONB.

use crate::domain::feature::{HeightMode, HeightTransformationStatus, StoredFeature};
use crate::domain::ids::{FeatureId, LayerId};
use crate::domain::job::{DebugInfo, ImportJob, JobStatus};
use crate::domain::{Result, StoreError};
use geo_types::Geometry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_postgres::Row;
use wkt::{ToWkt, TryFromWkt};

/// Serializes a snake_case enum to its column text
pub fn enum_to_text<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))? {
        Value::String(s) => Ok(s),
        other => Err(StoreError::Serialization(format!(
            "expected string-serializable enum, got {other}"
        ))
        .into()),
    }
}

/// Deserializes a snake_case enum from its column text
pub fn enum_from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_value(Value::String(text.to_string()))
        .map_err(|e| StoreError::Serialization(format!("invalid enum value '{text}': {e}")).into())
}

/// Encodes a footprint as WKT text
pub fn geometry_to_wkt(geometry: &Geometry<f64>) -> String {
    geometry.wkt_string()
}

/// Decodes a footprint from WKT text
pub fn geometry_from_wkt(text: &str) -> Result<Geometry<f64>> {
    Geometry::try_from_wkt_str(text)
        .map_err(|e| StoreError::Serialization(format!("invalid WKT: {e}")).into())
}

/// Maps a features row to a StoredFeature
pub fn feature_from_row(row: &Row) -> Result<StoredFeature> {
    let attributes = match row.get::<_, Value>("attributes") {
        Value::Object(map) => map,
        _ => Default::default(),
    };

    Ok(StoredFeature {
        id: FeatureId::from_uuid(row.get("id")),
        layer_id: LayerId::from_uuid(row.get("layer_id")),
        footprint: geometry_from_wkt(row.get("footprint_wkt"))?,
        base_elevation_ellipsoidal: row.get("base_elevation_ellipsoidal"),
        object_height: row.get("object_height"),
        height_mode: enum_from_text::<HeightMode>(row.get("height_mode"))?,
        height_source: row.get("height_source"),
        vertical_datum_source: row.get("vertical_datum_source"),
        height_transformation_status: enum_from_text::<HeightTransformationStatus>(
            row.get("height_transformation_status"),
        )?,
        height_transformation_error: row.get("height_transformation_error"),
        attributes,
        created_at: row.get("created_at"),
    })
}

/// Maps an import_jobs row to an ImportJob
pub fn job_from_row(row: &Row) -> Result<ImportJob> {
    let debug_info: DebugInfo = serde_json::from_value(row.get::<_, Value>("debug_info"))
        .map_err(|e| StoreError::Serialization(format!("invalid debug_info: {e}")))?;

    Ok(ImportJob {
        id: crate::domain::ids::JobId::from_uuid(row.get("id")),
        layer_id: row
            .get::<_, Option<uuid::Uuid>>("layer_id")
            .map(LayerId::from_uuid),
        layer_name: row.get("layer_name"),
        total_features: row.get::<_, i64>("total_features") as usize,
        imported_count: row.get::<_, i64>("imported_count") as usize,
        failed_count: row.get::<_, i64>("failed_count") as usize,
        skipped_count: row.get::<_, i64>("skipped_count") as usize,
        status: enum_from_text::<JobStatus>(row.get("status"))?,
        debug_info,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;

    #[test]
    fn test_enum_text_roundtrip() {
        let text = enum_to_text(&HeightMode::AbsoluteEllipsoidal).unwrap();
        assert_eq!(text, "absolute_ellipsoidal");
        let back: HeightMode = enum_from_text(&text).unwrap();
        assert_eq!(back, HeightMode::AbsoluteEllipsoidal);

        let text = enum_to_text(&JobStatus::Processing).unwrap();
        assert_eq!(text, "processing");
        let text = enum_to_text(&HeightTransformationStatus::NotRequired).unwrap();
        assert_eq!(text, "not_required");
    }

    #[test]
    fn test_enum_from_invalid_text() {
        assert!(enum_from_text::<HeightMode>("sideways").is_err());
    }

    #[test]
    fn test_geometry_wkt_roundtrip() {
        let geometry = Geometry::Point(Point::new(7.438632, 46.951082));
        let wkt = geometry_to_wkt(&geometry);
        assert!(wkt.starts_with("POINT"));

        let back = geometry_from_wkt(&wkt).unwrap();
        assert_eq!(back, geometry);
    }

    #[test]
    fn test_invalid_wkt_is_error() {
        assert!(geometry_from_wkt("POINT OF NO RETURN").is_err());
    }
}
