//! Geometry engine abstraction.
//!
//! The map never does polygon math itself. Repair, area, clipping,
//! containment and distance all go through a [`GeometryEngine`], with
//! [`GeoEngine`] (backed by the `geo` crate) as the default implementation.

use std::fmt;

use geo::orient::{Direction, Orient};
use geo::{
    Area, BooleanOps, BoundingRect, Closest, ClosestPoint, Coord, Distance, Geodesic,
    GeodesicArea, Intersects, LineString, MapCoords, MultiPolygon, Point, Polygon, Rect,
};

use crate::model::{Envelope, LatLon, Region, Ring};
use crate::{Error, Result};

/// Polygon capabilities needed to build and query a time zone map.
pub trait GeometryEngine: Send + Sync {
    /// Engine-native polygon type held by the loaded map.
    type Geometry: Clone + fmt::Debug + Send + Sync;

    /// Convert regions into one engine-native geometry.
    fn reify(&self, regions: &[Region]) -> Self::Geometry;

    /// Fix self-intersections and winding. May split the region into several.
    fn simplify_repair(&self, region: &Region) -> Result<Vec<Region>>;

    /// Real-world area in square meters.
    fn area(&self, geometry: &Self::Geometry) -> f64;

    /// Exact bounding box, or `None` for an empty geometry.
    fn extents(&self, geometry: &Self::Geometry) -> Option<Envelope>;

    /// Point-in-polygon test that counts the boundary as inside.
    fn contains_inclusive(&self, geometry: &Self::Geometry, point: LatLon) -> bool;

    /// Intersect with a rectangle, returning only non-empty 2D pieces.
    fn intersect(&self, geometry: &Self::Geometry, rectangle: &Envelope) -> Vec<Self::Geometry>;

    /// Closest point on any ring of the geometry.
    fn nearest_boundary_point(&self, geometry: &Self::Geometry, point: LatLon) -> Option<LatLon>;

    /// Distance in meters on the WGS84 ellipsoid.
    fn geodesic_distance(&self, a: LatLon, b: LatLon) -> f64;
}

/// [`GeometryEngine`] backed by the `geo` crate.
///
/// Coordinates map to `geo` as `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEngine;

impl GeoEngine {
    pub fn new() -> Self {
        Self
    }
}

fn to_coord(point: &LatLon) -> Coord<f64> {
    Coord {
        x: point.longitude,
        y: point.latitude,
    }
}

fn to_point(point: LatLon) -> Point<f64> {
    Point::new(point.longitude, point.latitude)
}

fn from_coord(coord: Coord<f64>) -> LatLon {
    LatLon::new(coord.y, coord.x)
}

fn to_line_string(ring: &Ring) -> LineString<f64> {
    LineString::new(ring.iter().map(to_coord).collect())
}

/// `geo` closes rings with a duplicate of the first point; our rings are implicitly closed.
fn from_line_string(line_string: &LineString<f64>) -> Ring {
    let mut ring: Ring = line_string.coords().map(|c| from_coord(*c)).collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn to_polygon(region: &Region) -> Option<Polygon<f64>> {
    let (outer, holes) = region.split_first()?;
    if outer.is_empty() {
        return None;
    }
    let interiors = holes
        .iter()
        .filter(|ring| !ring.is_empty())
        .map(to_line_string)
        .collect();
    Some(Polygon::new(to_line_string(outer), interiors))
}

fn from_polygon(polygon: &Polygon<f64>) -> Region {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(from_line_string)
        .filter(|ring| !ring.is_empty())
        .collect()
}

fn to_envelope(rect: Rect<f64>) -> Envelope {
    Envelope::new(rect.min().y, rect.min().x, rect.max().y, rect.max().x)
}

/// Clip edge drift tolerance in degrees (about 1 cm).
const EDGE_SNAP_DEGREES: f64 = 1e-7;

fn snap_to_edges(value: f64, min: f64, max: f64) -> f64 {
    let value = value.clamp(min, max);
    if value - min <= EDGE_SNAP_DEGREES {
        min
    } else if max - value <= EDGE_SNAP_DEGREES {
        max
    } else {
        value
    }
}

fn to_rect(envelope: &Envelope) -> Rect<f64> {
    Rect::new(to_coord(&envelope.lower_left), to_coord(&envelope.upper_right))
}

impl GeometryEngine for GeoEngine {
    type Geometry = MultiPolygon<f64>;

    /// Rings are reoriented (outer counter-clockwise, holes clockwise) so
    /// archives of any winding give the same areas.
    fn reify(&self, regions: &[Region]) -> MultiPolygon<f64> {
        MultiPolygon::new(regions.iter().filter_map(to_polygon).collect()).orient(Direction::Default)
    }

    fn simplify_repair(&self, region: &Region) -> Result<Vec<Region>> {
        if let Some(bad) = region.iter().flatten().find(|p| !p.is_finite()) {
            return Err(Error::Geometry(format!(
                "non-finite coordinate ({}, {})",
                bad.latitude, bad.longitude
            )));
        }
        let Some(polygon) = to_polygon(region) else {
            return Ok(Vec::new());
        };

        // Overlaying with nothing rebuilds the rings from scratch, resolving
        // self-intersections. The overlay emits clockwise outer rings.
        let repaired = MultiPolygon::new(vec![polygon])
            .union(&MultiPolygon::new(Vec::new()))
            .orient(Direction::Default);

        Ok(repaired
            .iter()
            .map(from_polygon)
            .filter(|region| region.first().map_or(false, |outer| outer.len() >= 3))
            .collect())
    }

    fn area(&self, geometry: &MultiPolygon<f64>) -> f64 {
        geometry.geodesic_area_unsigned()
    }

    fn extents(&self, geometry: &MultiPolygon<f64>) -> Option<Envelope> {
        geometry.bounding_rect().map(to_envelope)
    }

    fn contains_inclusive(&self, geometry: &MultiPolygon<f64>, point: LatLon) -> bool {
        geometry.intersects(&to_point(point))
    }

    fn intersect(&self, geometry: &MultiPolygon<f64>, rectangle: &Envelope) -> Vec<MultiPolygon<f64>> {
        let rect = to_rect(rectangle);
        let clip = MultiPolygon::new(vec![rect.to_polygon()]);
        let clipped = geometry.intersection(&clip);

        // The overlay snaps to an internal grid, moving clip edges slightly in
        // either direction. Put them back exactly onto the rectangle.
        let (min, max) = (rect.min(), rect.max());
        let pieces: Vec<Polygon<f64>> = clipped
            .into_iter()
            .map(|polygon| {
                polygon.map_coords(|c| Coord {
                    x: snap_to_edges(c.x, min.x, max.x),
                    y: snap_to_edges(c.y, min.y, max.y),
                })
            })
            // Slivers collapsing to lines or points have no area.
            .filter(|polygon| polygon.exterior().0.len() >= 4 && polygon.unsigned_area() > 0.0)
            .collect();
        if pieces.is_empty() {
            Vec::new()
        } else {
            vec![MultiPolygon::new(pieces)]
        }
    }

    fn nearest_boundary_point(&self, geometry: &MultiPolygon<f64>, point: LatLon) -> Option<LatLon> {
        let target = to_point(point);
        geometry
            .iter()
            .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
            .filter_map(|ring| match ring.closest_point(&target) {
                Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p),
                Closest::Indeterminate => None,
            })
            .min_by(|a, b| {
                let da = (a.x() - target.x()).powi(2) + (a.y() - target.y()).powi(2);
                let db = (b.x() - target.x()).powi(2) + (b.y() - target.y()).powi(2);
                da.total_cmp(&db)
            })
            .map(|p| LatLon::new(p.y(), p.x()))
    }

    fn geodesic_distance(&self, a: LatLon, b: LatLon) -> f64 {
        Geodesic::distance(to_point(a), to_point(b))
    }
}
