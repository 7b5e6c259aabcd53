//! Geometry validator/repairer
//!
//! Normalizes and repairs a single geometry in its source reference frame:
//! consecutive duplicate vertices are removed, topological validity is
//! tested, and invalid areal geometries go through an escalating repair.
//! Zero-width buffering is cheap and fixes the common self-intersection
//! case, so it runs first; the heavier self-union only runs when buffering
//! does not yield a valid result.

use crate::domain::errors::PipelineError;
use geo::algorithm::{BooleanOps, CoordsIter, RemoveRepeatedPoints, Validation};
use geo_types::{Geometry, MultiPolygon};

/// What had to be done to obtain a valid geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryProvenance {
    /// Input was valid as supplied
    Unchanged,
    /// Consecutive duplicate vertices were removed
    VertexDeduplicated,
    /// A repair step produced the valid geometry
    Repaired,
}

/// A geometry guaranteed topologically valid in its source reference frame
#[derive(Debug, Clone)]
pub struct ValidatedGeometry {
    pub geometry: Geometry<f64>,
    pub provenance: GeometryProvenance,
}

impl ValidatedGeometry {
    /// Whether any normalization or repair was applied
    pub fn was_modified(&self) -> bool {
        self.provenance != GeometryProvenance::Unchanged
    }
}

/// Validates a geometry, repairing it if necessary
///
/// # Errors
///
/// Returns `PipelineError::GeometryInvalid` carrying the original
/// invalidity reason when the geometry cannot be repaired or the repair
/// degenerates to an empty geometry. Reported per feature, never fatal to
/// a batch.
pub fn validate_and_repair(geometry: &Geometry<f64>) -> Result<ValidatedGeometry, PipelineError> {
    if geometry.coords_count() == 0 {
        return Err(PipelineError::GeometryInvalid {
            reason: "empty geometry".to_string(),
        });
    }

    let deduplicated = remove_consecutive_duplicates(geometry);
    let provenance = if deduplicated.coords_count() != geometry.coords_count() {
        GeometryProvenance::VertexDeduplicated
    } else {
        GeometryProvenance::Unchanged
    };

    if deduplicated.is_valid() {
        return Ok(ValidatedGeometry {
            geometry: deduplicated,
            provenance,
        });
    }

    let reason = invalidity_reason(&deduplicated);

    if let Some(repaired) = try_repair(&deduplicated) {
        tracing::debug!(reason = %reason, "Repaired invalid geometry");
        return Ok(ValidatedGeometry {
            geometry: repaired,
            provenance: GeometryProvenance::Repaired,
        });
    }

    Err(PipelineError::GeometryInvalid { reason })
}

/// Extracts the invalidity diagnosis for a geometry
fn invalidity_reason(geometry: &Geometry<f64>) -> String {
    geometry
        .check_validation()
        .err()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown invalidity".to_string())
}

fn remove_consecutive_duplicates(geometry: &Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(g) => Geometry::LineString(g.remove_repeated_points()),
        Geometry::Polygon(g) => Geometry::Polygon(g.remove_repeated_points()),
        Geometry::MultiLineString(g) => Geometry::MultiLineString(g.remove_repeated_points()),
        Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.remove_repeated_points()),
        other => other.clone(),
    }
}

/// Escalating repair for areal geometries
///
/// Step 1 is a zero-width buffer, step 2 a validity-restoring self-union.
/// Non-areal geometries are not repairable here.
fn try_repair(geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
    let buffered = match geometry {
        Geometry::Polygon(p) => geo_buf::buffer_polygon(p, 0.0),
        Geometry::MultiPolygon(mp) => geo_buf::buffer_multi_polygon(mp, 0.0),
        _ => return None,
    };

    if let Some(valid) = usable(buffered) {
        return Some(valid);
    }

    let unioned = match geometry {
        Geometry::Polygon(p) => p.union(p),
        Geometry::MultiPolygon(mp) => mp.union(mp),
        _ => return None,
    };

    usable(unioned)
}

/// Accepts a repair result only if it is valid and non-empty
fn usable(candidate: MultiPolygon<f64>) -> Option<Geometry<f64>> {
    if candidate.0.is_empty() || candidate.coords_count() == 0 {
        return None;
    }

    let geometry = normalize_multi(candidate);
    if geometry.is_valid() {
        Some(geometry)
    } else {
        None
    }
}

/// Collapses a single-member multipolygon back to a polygon
fn normalize_multi(mut multi: MultiPolygon<f64>) -> Geometry<f64> {
    if multi.0.len() == 1 {
        Geometry::Polygon(multi.0.remove(0))
    } else {
        Geometry::MultiPolygon(multi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Coord, LineString, Point, Polygon};

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        )
    }

    /// Classic bowtie: exterior ring crosses itself at (5, 5)
    fn bowtie() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 10.0),
                (10.0, 0.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_valid_polygon_unchanged() {
        let validated = validate_and_repair(&Geometry::Polygon(square())).unwrap();
        assert_eq!(validated.provenance, GeometryProvenance::Unchanged);
        assert!(!validated.was_modified());
    }

    #[test]
    fn test_point_unchanged() {
        let validated = validate_and_repair(&Geometry::Point(Point::new(1.0, 2.0))).unwrap();
        assert_eq!(validated.provenance, GeometryProvenance::Unchanged);
    }

    #[test]
    fn test_duplicate_vertices_removed() {
        let line = LineString(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 5.0, y: 5.0 },
        ]);

        let validated = validate_and_repair(&Geometry::LineString(line)).unwrap();
        assert_eq!(validated.provenance, GeometryProvenance::VertexDeduplicated);
        match validated.geometry {
            Geometry::LineString(ls) => assert_eq!(ls.0.len(), 2),
            other => panic!("expected LineString, got {other:?}"),
        }
    }

    #[test]
    fn test_bowtie_is_repaired() {
        let validated = validate_and_repair(&Geometry::Polygon(bowtie())).unwrap();
        assert_eq!(validated.provenance, GeometryProvenance::Repaired);
        assert!(validated.geometry.is_valid());
    }

    #[test]
    fn test_empty_geometry_fails() {
        let empty = Geometry::LineString(LineString(Vec::new()));
        let err = validate_and_repair(&empty).unwrap_err();
        assert!(matches!(err, PipelineError::GeometryInvalid { .. }));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_degenerate_line_reports_original_reason() {
        // A line collapsing to a single point cannot be repaired; the error
        // must carry the validity diagnosis, not a repair-step artifact.
        let line = LineString(vec![Coord { x: 1.0, y: 1.0 }, Coord { x: 1.0, y: 1.0 }]);
        let err = validate_and_repair(&Geometry::LineString(line)).unwrap_err();

        match err {
            PipelineError::GeometryInvalid { reason } => {
                assert!(!reason.is_empty());
                assert!(!reason.contains("repair"));
            }
            other => panic!("expected GeometryInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_polygon_valid() {
        let mp = MultiPolygon(vec![square()]);
        let validated = validate_and_repair(&Geometry::MultiPolygon(mp)).unwrap();
        assert_eq!(validated.provenance, GeometryProvenance::Unchanged);
    }
}
