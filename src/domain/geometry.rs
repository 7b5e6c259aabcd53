//! Raw geometry parsing
//!
//! Input geometries arrive as GeoJSON-shaped JSON objects with 2- or
//! 3-element positions. They are processed directly from the coordinate
//! arrays so the optional Z value survives until height resolution; the
//! 2D footprint is converted into `geo_types` for validation and
//! reprojection.

use crate::domain::errors::PipelineError;
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde_json::Value;

/// A single parsed position with an optional third coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPosition {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl RawPosition {
    fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// A parsed input geometry retaining per-position Z values
///
/// Only the geometry types produced by the upstream decoders are supported;
/// anything else is a parse failure, reported per feature.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    Point(RawPosition),
    LineString(Vec<RawPosition>),
    Polygon(Vec<Vec<RawPosition>>),
    MultiPoint(Vec<RawPosition>),
    MultiLineString(Vec<Vec<RawPosition>>),
    MultiPolygon(Vec<Vec<Vec<RawPosition>>>),
}

impl RawGeometry {
    /// Parses a GeoJSON-shaped geometry object
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::GeometryParseFailed` for missing/unknown type
    /// tags, malformed coordinate arrays, or non-finite coordinate values.
    pub fn from_value(value: &Value) -> Result<Self, PipelineError> {
        let obj = value
            .as_object()
            .ok_or_else(|| parse_err("geometry is not a JSON object"))?;

        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| parse_err("geometry has no 'type' tag"))?;

        let coordinates = obj
            .get("coordinates")
            .ok_or_else(|| parse_err("geometry has no 'coordinates'"))?;

        match kind {
            "Point" => Ok(RawGeometry::Point(parse_position(coordinates)?)),
            "LineString" => Ok(RawGeometry::LineString(parse_positions(coordinates)?)),
            "Polygon" => Ok(RawGeometry::Polygon(parse_rings(coordinates)?)),
            "MultiPoint" => Ok(RawGeometry::MultiPoint(parse_positions(coordinates)?)),
            "MultiLineString" => Ok(RawGeometry::MultiLineString(parse_rings(coordinates)?)),
            "MultiPolygon" => {
                let arr = as_array(coordinates)?;
                let polygons = arr
                    .iter()
                    .map(parse_rings)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RawGeometry::MultiPolygon(polygons))
            }
            other => Err(parse_err(&format!("unsupported geometry type '{other}'"))),
        }
    }

    /// Whether the geometry has no coordinates at all
    pub fn is_empty(&self) -> bool {
        match self {
            RawGeometry::Point(_) => false,
            RawGeometry::LineString(positions) | RawGeometry::MultiPoint(positions) => {
                positions.is_empty()
            }
            RawGeometry::Polygon(rings) | RawGeometry::MultiLineString(rings) => {
                rings.iter().all(|r| r.is_empty())
            }
            RawGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .all(|rings| rings.iter().all(|r| r.is_empty())),
        }
    }

    /// Extracts the leading Z coordinate, if present
    ///
    /// A point uses its own Z, a line the first vertex's Z, a polygon the
    /// first vertex of the exterior ring; multi-geometries defer to their
    /// first member.
    pub fn first_z(&self) -> Option<f64> {
        match self {
            RawGeometry::Point(p) => p.z,
            RawGeometry::LineString(positions) | RawGeometry::MultiPoint(positions) => {
                positions.first().and_then(|p| p.z)
            }
            RawGeometry::Polygon(rings) | RawGeometry::MultiLineString(rings) => {
                rings.first().and_then(|r| r.first()).and_then(|p| p.z)
            }
            RawGeometry::MultiPolygon(polygons) => polygons
                .first()
                .and_then(|rings| rings.first())
                .and_then(|r| r.first())
                .and_then(|p| p.z),
        }
    }

    /// Converts into a 2D `geo_types` footprint, dropping Z values
    pub fn to_geo(&self) -> Geometry<f64> {
        match self {
            RawGeometry::Point(p) => Geometry::Point(Point::from(p.coord())),
            RawGeometry::LineString(positions) => {
                Geometry::LineString(line_string(positions))
            }
            RawGeometry::Polygon(rings) => Geometry::Polygon(polygon(rings)),
            RawGeometry::MultiPoint(positions) => Geometry::MultiPoint(MultiPoint(
                positions.iter().map(|p| Point::from(p.coord())).collect(),
            )),
            RawGeometry::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString(
                lines.iter().map(|l| line_string(l)).collect(),
            )),
            RawGeometry::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon(
                polygons.iter().map(|rings| polygon(rings)).collect(),
            )),
        }
    }

    /// Human-readable type tag, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            RawGeometry::Point(_) => "Point",
            RawGeometry::LineString(_) => "LineString",
            RawGeometry::Polygon(_) => "Polygon",
            RawGeometry::MultiPoint(_) => "MultiPoint",
            RawGeometry::MultiLineString(_) => "MultiLineString",
            RawGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

fn line_string(positions: &[RawPosition]) -> LineString<f64> {
    LineString(positions.iter().map(RawPosition::coord).collect())
}

fn polygon(rings: &[Vec<RawPosition>]) -> Polygon<f64> {
    let exterior = rings
        .first()
        .map(|r| line_string(r))
        .unwrap_or_else(|| LineString(Vec::new()));
    let interiors: Vec<LineString<f64>> =
        rings.iter().skip(1).map(|r| line_string(r)).collect();
    Polygon::new(exterior, interiors)
}

fn parse_err(message: &str) -> PipelineError {
    PipelineError::GeometryParseFailed(message.to_string())
}

fn as_array(value: &Value) -> Result<&Vec<Value>, PipelineError> {
    value
        .as_array()
        .ok_or_else(|| parse_err("expected a coordinate array"))
}

fn parse_position(value: &Value) -> Result<RawPosition, PipelineError> {
    let arr = as_array(value)?;
    if arr.len() < 2 {
        return Err(parse_err("position has fewer than 2 coordinates"));
    }

    let x = number_at(arr, 0)?;
    let y = number_at(arr, 1)?;
    let z = match arr.get(2) {
        Some(v) => Some(finite(v.as_f64().ok_or_else(|| {
            parse_err("third coordinate is not a number")
        })?)?),
        None => None,
    };

    Ok(RawPosition { x, y, z })
}

fn number_at(arr: &[Value], index: usize) -> Result<f64, PipelineError> {
    let value = arr[index]
        .as_f64()
        .ok_or_else(|| parse_err(&format!("coordinate {index} is not a number")))?;
    finite(value)
}

fn finite(value: f64) -> Result<f64, PipelineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(parse_err("non-finite coordinate value"))
    }
}

fn parse_positions(value: &Value) -> Result<Vec<RawPosition>, PipelineError> {
    as_array(value)?.iter().map(parse_position).collect()
}

fn parse_rings(value: &Value) -> Result<Vec<Vec<RawPosition>>, PipelineError> {
    as_array(value)?.iter().map(parse_positions).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_point_with_z() {
        let geom = RawGeometry::from_value(&json!({
            "type": "Point",
            "coordinates": [2600000.0, 1200000.0, 612.3]
        }))
        .unwrap();

        assert_eq!(geom.first_z(), Some(612.3));
        assert!(matches!(geom, RawGeometry::Point(_)));
    }

    #[test]
    fn test_parse_point_without_z() {
        let geom = RawGeometry::from_value(&json!({
            "type": "Point",
            "coordinates": [7.45, 46.95]
        }))
        .unwrap();

        assert_eq!(geom.first_z(), None);
    }

    #[test]
    fn test_parse_polygon_first_z_from_exterior_ring() {
        let geom = RawGeometry::from_value(&json!({
            "type": "Polygon",
            "coordinates": [[
                [0.0, 0.0, 455.5], [10.0, 0.0, 456.0], [10.0, 10.0], [0.0, 0.0, 455.5]
            ]]
        }))
        .unwrap();

        assert_eq!(geom.first_z(), Some(455.5));
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = RawGeometry::from_value(&json!({
            "type": "GeometryCollection",
            "coordinates": []
        }))
        .unwrap_err();

        assert!(matches!(err, PipelineError::GeometryParseFailed(_)));
        assert!(err.to_string().contains("GeometryCollection"));
    }

    #[test]
    fn test_parse_rejects_non_finite_coordinate() {
        // JSON cannot encode infinity directly, but a null coordinate slot
        // takes the same rejection path.
        let err = RawGeometry::from_value(&json!({
            "type": "Point",
            "coordinates": [1.0, null]
        }))
        .unwrap_err();

        assert!(matches!(err, PipelineError::GeometryParseFailed(_)));
    }

    #[test]
    fn test_parse_rejects_short_position() {
        let err = RawGeometry::from_value(&json!({
            "type": "Point",
            "coordinates": [1.0]
        }))
        .unwrap_err();

        assert!(err.to_string().contains("fewer than 2"));
    }

    #[test]
    fn test_to_geo_drops_z() {
        let geom = RawGeometry::from_value(&json!({
            "type": "LineString",
            "coordinates": [[0.0, 0.0, 100.0], [1.0, 1.0, 101.0]]
        }))
        .unwrap();

        match geom.to_geo() {
            Geometry::LineString(ls) => {
                assert_eq!(ls.0.len(), 2);
                assert_eq!(ls.0[0], Coord { x: 0.0, y: 0.0 });
            }
            other => panic!("expected LineString, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_polygon_roundtrip() {
        let geom = RawGeometry::from_value(&json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]],
                [[[10.0, 10.0], [14.0, 10.0], [14.0, 14.0], [10.0, 10.0]]]
            ]
        }))
        .unwrap();

        assert_eq!(geom.type_name(), "MultiPolygon");
        match geom.to_geo() {
            Geometry::MultiPolygon(mp) => assert_eq!(mp.0.len(), 2),
            other => panic!("expected MultiPolygon, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_line_string_is_empty() {
        let geom = RawGeometry::from_value(&json!({
            "type": "LineString",
            "coordinates": []
        }))
        .unwrap();

        assert!(geom.is_empty());
    }
}
