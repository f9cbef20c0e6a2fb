//! Zone geometry validation and overlap conflict detection.
//!
//! Zones store raw GeoJSON (`Polygon` or `MultiPolygon`) as JSONB. This
//! module is the only place that interprets it: structural validation for
//! candidate geometries on the write path, and the erosion-buffer overlap
//! rule that keeps active zones from meaningfully covering each other.
//!
//! Overlap detection is deliberately O(N) over active zones. At the fleet
//! sizes this service manages (hundreds of zones), a spatial index would buy
//! nothing and cost a dependency.

use geo::{
    Area, BooleanOps, BoundingRect, Buffer, Contains, Coord, Intersects, LineString, MultiPolygon,
    Point, Polygon, Rect, Validation,
};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Tuning constants
// ---------------------------------------------------------------------------

/// Inward shrink applied to both geometries before overlap comparison, in
/// degrees (roughly one metre at the equator). Zones that only share an edge
/// become disjoint after erosion and therefore never conflict.
pub const EROSION_BUFFER_DEGREES: f64 = 1e-5;

/// Minimum intersection area, in square degrees, that counts as a conflict.
/// Intersections at or below this are treated as numerical noise.
pub const OVERLAP_AREA_EPSILON: f64 = 1e-7;

// ---------------------------------------------------------------------------
// Structural validation (write path)
// ---------------------------------------------------------------------------

/// Validate a candidate GeoJSON geometry and convert it for overlap math.
///
/// Accepts only `Polygon` and `MultiPolygon`. Every ring must carry at least
/// 4 positions, be explicitly closed, and contain no consecutive duplicate
/// positions. The assembled geometry must also pass planar validity (no
/// self-intersecting or degenerate rings).
pub fn validate_structure(value: &serde_json::Value) -> Result<MultiPolygon<f64>, CoreError> {
    let geometry: geojson::Geometry = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::InvalidGeometry(format!("not a GeoJSON geometry: {e}")))?;

    let multi = match &geometry.value {
        geojson::Value::Polygon(rings) => MultiPolygon(vec![polygon_from_rings(rings)?]),
        geojson::Value::MultiPolygon(polygons) => {
            if polygons.is_empty() {
                return Err(CoreError::InvalidGeometry(
                    "MultiPolygon must contain at least one polygon".to_string(),
                ));
            }
            MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| polygon_from_rings(rings))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
        _ => {
            return Err(CoreError::InvalidGeometry(
                "geometry must be a Polygon or MultiPolygon".to_string(),
            ))
        }
    };

    if !multi.is_valid() {
        return Err(CoreError::InvalidGeometry(
            "self-intersecting or otherwise invalid polygon".to_string(),
        ));
    }
    Ok(multi)
}

/// Parse a stored zone geometry for comparison, without the write-path checks.
///
/// Stored geometries were validated when written; `None` here means a row
/// predating a rule change, and the caller decides whether to skip it.
pub fn parse_stored(value: &serde_json::Value) -> Option<MultiPolygon<f64>> {
    let geometry: geojson::Geometry = serde_json::from_value(value.clone()).ok()?;
    match &geometry.value {
        geojson::Value::Polygon(rings) => Some(MultiPolygon(vec![lenient_polygon(rings)?])),
        geojson::Value::MultiPolygon(polygons) => Some(MultiPolygon(
            polygons
                .iter()
                .map(|rings| lenient_polygon(rings))
                .collect::<Option<Vec<_>>>()?,
        )),
        _ => None,
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, CoreError> {
    let Some((exterior, holes)) = rings.split_first() else {
        return Err(CoreError::InvalidGeometry(
            "polygon must have an exterior ring".to_string(),
        ));
    };
    for ring in rings {
        check_ring(ring)?;
    }
    Ok(Polygon::new(
        ring_to_line_string(exterior),
        holes.iter().map(|h| ring_to_line_string(h)).collect(),
    ))
}

fn check_ring(ring: &[Vec<f64>]) -> Result<(), CoreError> {
    if ring.len() < 4 {
        return Err(CoreError::InvalidGeometry(
            "each ring must contain at least 4 positions".to_string(),
        ));
    }
    for position in ring {
        if position.len() < 2 {
            return Err(CoreError::InvalidGeometry(
                "each position must carry longitude and latitude".to_string(),
            ));
        }
    }
    let (first, last) = (&ring[0], &ring[ring.len() - 1]);
    if first[0] != last[0] || first[1] != last[1] {
        return Err(CoreError::InvalidGeometry(
            "ring must be closed (first and last positions equal)".to_string(),
        ));
    }
    for pair in ring.windows(2) {
        if pair[0][0] == pair[1][0] && pair[0][1] == pair[1][1] {
            return Err(CoreError::InvalidGeometry(
                "ring contains consecutive duplicate positions".to_string(),
            ));
        }
    }
    Ok(())
}

fn lenient_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    if exterior.iter().any(|p| p.len() < 2) || holes.iter().flatten().any(|p| p.len() < 2) {
        return None;
    }
    Some(Polygon::new(
        ring_to_line_string(exterior),
        holes.iter().map(|h| ring_to_line_string(h)).collect(),
    ))
}

fn ring_to_line_string(ring: &[Vec<f64>]) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|p| Coord { x: p[0], y: p[1] })
            .collect::<Vec<_>>(),
    )
}

// ---------------------------------------------------------------------------
// Overlap conflict detection
// ---------------------------------------------------------------------------

/// Erode a geometry inward by [`EROSION_BUFFER_DEGREES`].
///
/// Slivers thinner than twice the buffer erode to nothing, which is exactly
/// the tolerance the epsilon exists for.
pub fn erode(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.buffer(-EROSION_BUFFER_DEGREES)
}

/// Compare a candidate against every active zone geometry.
///
/// Both sides are eroded before intersecting, so zones sharing only a
/// boundary pass. Returns the first zone whose eroded intersection with the
/// eroded candidate exceeds [`OVERLAP_AREA_EPSILON`].
pub fn find_conflict<'a, I>(candidate: &MultiPolygon<f64>, others: I) -> Result<(), CoreError>
where
    I: IntoIterator<Item = (DbId, &'a MultiPolygon<f64>)>,
{
    let eroded = erode(candidate);
    if eroded.0.is_empty() {
        return Ok(());
    }
    for (zone_id, other) in others {
        let other_eroded = erode(other);
        if other_eroded.0.is_empty() {
            continue;
        }
        if eroded.intersection(&other_eroded).unsigned_area() > OVERLAP_AREA_EPSILON {
            return Err(CoreError::GeometryConflict {
                conflicting_zone_id: zone_id,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read-path helpers
// ---------------------------------------------------------------------------

/// Whether the geometry contains the given point (interior containment).
pub fn contains_point(geometry: &MultiPolygon<f64>, lng: f64, lat: f64) -> bool {
    geometry.contains(&Point::new(lng, lat))
}

/// Whether the geometry's bounding rectangle intersects the given box.
pub fn intersects_bbox(
    geometry: &MultiPolygon<f64>,
    min_lng: f64,
    min_lat: f64,
    max_lng: f64,
    max_lat: f64,
) -> bool {
    let Some(rect) = geometry.bounding_rect() else {
        return false;
    };
    let query = Rect::new(
        Coord {
            x: min_lng,
            y: min_lat,
        },
        Coord {
            x: max_lng,
            y: max_lat,
        },
    );
    rect.intersects(&query)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
