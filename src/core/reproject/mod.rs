//! Coordinate reprojector
//!
//! Transforms a geometry's horizontal coordinates between reference frames
//! using PROJ. Reprojection is pure: it either succeeds deterministically
//! or fails deterministically for given inputs, and there are no retry
//! semantics. A fresh transformation handle is built per call so the
//! reprojector itself stays free of FFI state.

use crate::domain::errors::PipelineError;
use crate::domain::ids::CrsId;
use geo::algorithm::{CoordsIter, MapCoords};
use geo_types::{Coord, Geometry};
use proj::Proj;

/// Reprojects 2D footprints between two reference frames
#[derive(Debug, Clone)]
pub struct Reprojector {
    source: CrsId,
    target: CrsId,
}

impl Reprojector {
    /// Creates a reprojector for a source/target frame pair
    pub fn new(source: CrsId, target: CrsId) -> Self {
        Self { source, target }
    }

    /// Source reference frame
    pub fn source(&self) -> &CrsId {
        &self.source
    }

    /// Target reference frame
    pub fn target(&self) -> &CrsId {
        &self.target
    }

    /// Whether source and target identify the same frame
    pub fn is_identity(&self) -> bool {
        self.source.authority_string() == self.target.authority_string()
    }

    /// Transforms a geometry into the target frame
    ///
    /// The identifiers' full definitions are used: a bare numeric code
    /// implies the EPSG authority. Identical frames short-circuit to a
    /// clone, which keeps reprojection idempotent on already-canonical
    /// input.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ReprojectionFailed` for empty geometries,
    /// unknown frame definitions, or coordinates PROJ cannot transform.
    pub fn transform(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>, PipelineError> {
        if geometry.coords_count() == 0 {
            return Err(PipelineError::ReprojectionFailed(
                "cannot reproject an empty geometry".to_string(),
            ));
        }

        if self.is_identity() {
            return Ok(geometry.clone());
        }

        let proj = Proj::new_known_crs(
            &self.source.authority_string(),
            &self.target.authority_string(),
            None,
        )
        .map_err(|e| {
            PipelineError::ReprojectionFailed(format!(
                "no transformation from {} to {}: {}",
                self.source, self.target, e
            ))
        })?;

        let transformed = geometry.try_map_coords(|coord| {
            let (x, y) = proj.convert((coord.x, coord.y)).map_err(|e| {
                PipelineError::ReprojectionFailed(format!(
                    "failed to transform ({}, {}): {}",
                    coord.x, coord.y, e
                ))
            })?;

            if !x.is_finite() || !y.is_finite() {
                return Err(PipelineError::ReprojectionFailed(format!(
                    "non-finite result for ({}, {})",
                    coord.x, coord.y
                )));
            }

            Ok(Coord { x, y })
        })?;

        Ok(transformed)
    }

    /// Transforms a single coordinate pair into the target frame
    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, PipelineError> {
        let transformed = self.transform(&Geometry::Point(coord.into()))?;
        match transformed {
            Geometry::Point(p) => Ok(p.0),
            _ => unreachable!("point transforms to point"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, Point};
    use std::str::FromStr;

    fn crs(s: &str) -> CrsId {
        CrsId::from_str(s).unwrap()
    }

    #[test]
    fn test_identity_is_clone() {
        let reprojector = Reprojector::new(crs("EPSG:4326"), crs("4326"));
        assert!(reprojector.is_identity());

        let geometry = Geometry::Point(Point::new(7.438632, 46.951082));
        let out = reprojector.transform(&geometry).unwrap();
        assert_eq!(out, geometry);
    }

    #[test]
    fn test_empty_geometry_fails() {
        let reprojector = Reprojector::new(crs("EPSG:2056"), crs("EPSG:4326"));
        let err = reprojector
            .transform(&Geometry::LineString(LineString(Vec::new())))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReprojectionFailed(_)));
    }

    #[test]
    fn test_lv95_to_wgs84_point() {
        // Bern reference point: LV95 (2600000, 1200000) is close to
        // 7.438632 E, 46.951082 N.
        let reprojector = Reprojector::new(crs("EPSG:2056"), crs("EPSG:4326"));
        let out = reprojector
            .transform(&Geometry::Point(Point::new(2_600_000.0, 1_200_000.0)))
            .unwrap();

        match out {
            Geometry::Point(p) => {
                assert!((p.x() - 7.438632).abs() < 1e-3);
                assert!((p.y() - 46.951082).abs() < 1e-3);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_numeric_code_implies_epsg() {
        let reprojector = Reprojector::new(crs("2056"), crs("4326"));
        let out = reprojector.transform(&Geometry::Point(Point::new(2_600_000.0, 1_200_000.0)));
        assert!(out.is_ok());
    }

    #[test]
    fn test_unknown_crs_fails_deterministically() {
        let reprojector = Reprojector::new(crs("EPSG:999999"), crs("EPSG:4326"));
        let err = reprojector
            .transform(&Geometry::Point(Point::new(0.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReprojectionFailed(_)));
    }

    #[test]
    fn test_transform_single_coord() {
        let reprojector = Reprojector::new(crs("EPSG:2056"), crs("EPSG:4326"));
        let out = reprojector
            .transform_coord(Coord {
                x: 2_600_000.0,
                y: 1_200_000.0,
            })
            .unwrap();
        assert!((out.x - 7.438632).abs() < 1e-3);
        assert!((out.y - 46.951082).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip_within_tolerance() {
        let forward = Reprojector::new(crs("EPSG:2056"), crs("EPSG:4326"));
        let back = Reprojector::new(crs("EPSG:4326"), crs("EPSG:2056"));

        let original = Geometry::Point(Point::new(2_612_345.0, 1_234_567.0));
        let there = forward.transform(&original).unwrap();
        let and_back = back.transform(&there).unwrap();

        match (original, and_back) {
            (Geometry::Point(a), Geometry::Point(b)) => {
                assert!((a.x() - b.x()).abs() < 1e-4);
                assert!((a.y() - b.y()).abs() < 1e-4);
            }
            _ => panic!("expected points"),
        }
    }
}
