//! In-memory representation of time zone boundaries.
//!
//! A [`GeoRecord`] is a zone identifier plus a list of disjoint regions. Each
//! region is a list of rings where the first ring is the outer boundary and the
//! remaining rings are holes (or islands within holes). Rings are implicitly
//! closed: the last point connects back to the first.

use crate::{Error, Result};

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    /// 90.0 is the north pole, -90.0 is the south pole, 0 is the equator.
    pub latitude: f64,
    /// -180.0 to 180.0, positive is East.
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Round both components to single precision, the precision stored in archives.
    pub fn quantized(self) -> Self {
        Self {
            latitude: self.latitude as f32 as f64,
            longitude: self.longitude as f32 as f64,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Closed point sequence.
pub type Ring = Vec<LatLon>;

/// Outer ring followed by hole rings.
pub type Region = Vec<Ring>;

/// A time zone identifier and (part of) the area it covers.
///
/// The identifier is not unique: one zone is usually split into several
/// records, one per disjoint region, all sharing the same `id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoRecord {
    pub id: String,
    pub regions: Vec<Region>,
}

impl GeoRecord {
    pub fn new(id: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            id: id.into(),
            regions,
        }
    }

    /// True if no region holds a single point.
    pub fn is_empty(&self) -> bool {
        self.points().next().is_none()
    }

    /// Iterate over every point of every ring of every region.
    pub fn points(&self) -> impl Iterator<Item = &LatLon> {
        self.regions.iter().flatten().flatten()
    }

    pub fn point_count(&self) -> usize {
        self.points().count()
    }

    /// Min/max over all points, or `None` for an empty record.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut points = self.points();
        let first = points.next()?;
        let mut envelope = Envelope {
            lower_left: *first,
            upper_right: *first,
        };
        for point in points {
            envelope.expand_to(point);
        }
        Some(envelope)
    }

    /// Drop zero-point rings and regions whose outer ring is gone.
    pub fn without_degenerate_rings(mut self) -> Self {
        for region in &mut self.regions {
            if region.first().map_or(true, |outer| outer.is_empty()) {
                region.clear();
                continue;
            }
            region.retain(|ring| !ring.is_empty());
        }
        self.regions.retain(|region| !region.is_empty());
        self
    }
}

/// Axis-aligned bounding box, inclusive of its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub lower_left: LatLon,
    pub upper_right: LatLon,
}

impl Envelope {
    pub fn new(min_latitude: f64, min_longitude: f64, max_latitude: f64, max_longitude: f64) -> Self {
        Self {
            lower_left: LatLon::new(min_latitude, min_longitude),
            upper_right: LatLon::new(max_latitude, max_longitude),
        }
    }

    /// The whole world.
    pub fn everywhere() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    /// Build index bounds, rejecting empty or inverted boxes.
    pub fn bounds(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Result<Self> {
        let envelope = Self::new(min_latitude, min_longitude, max_latitude, max_longitude);
        envelope.validate_bounds()?;
        Ok(envelope)
    }

    /// Index bounds need a strictly positive extent on both axes.
    pub fn validate_bounds(&self) -> Result<()> {
        // Written as negations so NaN is rejected too.
        if !(self.lower_left.latitude < self.upper_right.latitude) {
            return Err(Error::InvalidBounds(
                "minimum latitude must be less than maximum latitude".to_string(),
            ));
        }
        if !(self.lower_left.longitude < self.upper_right.longitude) {
            return Err(Error::InvalidBounds(
                "minimum longitude must be less than maximum longitude".to_string(),
            ));
        }
        Ok(())
    }

    pub fn min_latitude(&self) -> f64 {
        self.lower_left.latitude
    }

    pub fn min_longitude(&self) -> f64 {
        self.lower_left.longitude
    }

    pub fn max_latitude(&self) -> f64 {
        self.upper_right.latitude
    }

    pub fn max_longitude(&self) -> f64 {
        self.upper_right.longitude
    }

    pub fn contains_point(&self, point: &LatLon) -> bool {
        point.latitude >= self.min_latitude()
            && point.latitude <= self.max_latitude()
            && point.longitude >= self.min_longitude()
            && point.longitude <= self.max_longitude()
    }

    /// True if `other` lies entirely inside this envelope.
    pub fn contains(&self, other: &Envelope) -> bool {
        self.contains_point(&other.lower_left) && self.contains_point(&other.upper_right)
    }

    /// True if the two boxes share at least one point.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_latitude() <= other.max_latitude()
            && other.min_latitude() <= self.max_latitude()
            && self.min_longitude() <= other.max_longitude()
            && other.min_longitude() <= self.max_longitude()
    }

    fn expand_to(&mut self, point: &LatLon) {
        self.lower_left.latitude = self.lower_left.latitude.min(point.latitude);
        self.lower_left.longitude = self.lower_left.longitude.min(point.longitude);
        self.upper_right.latitude = self.upper_right.latitude.max(point.latitude);
        self.upper_right.longitude = self.upper_right.longitude.max(point.longitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Region {
        vec![vec![
            LatLon::new(min, min),
            LatLon::new(min, max),
            LatLon::new(max, max),
            LatLon::new(max, min),
        ]]
    }

    #[test]
    fn test_record_envelope() {
        let record = GeoRecord::new("Test/Zone", vec![square(1.0, 2.0), square(-3.0, -2.5)]);
        let envelope = record.envelope().unwrap();
        assert_eq!(envelope, Envelope::new(-3.0, -3.0, 2.0, 2.0));
    }

    #[test]
    fn test_empty_record_has_no_envelope() {
        let record = GeoRecord::new("Test/Zone", vec![vec![vec![]]]);
        assert!(record.is_empty());
        assert!(record.envelope().is_none());
    }

    #[test]
    fn test_without_degenerate_rings() {
        let mut holed = square(0.0, 10.0);
        holed.push(Vec::new());
        holed.push(square(4.0, 5.0).remove(0));
        let record = GeoRecord::new(
            "Test/Zone",
            vec![holed, vec![Vec::new(), square(20.0, 21.0).remove(0)]],
        )
        .without_degenerate_rings();

        assert_eq!(record.regions.len(), 1);
        assert_eq!(record.regions[0].len(), 2);
        assert_eq!(record.point_count(), 8);
    }

    #[test]
    fn test_bounds_validation() {
        assert!(Envelope::bounds(0.0, 0.0, 10.0, 10.0).is_ok());
        assert!(matches!(
            Envelope::bounds(10.0, 0.0, 10.0, 10.0),
            Err(Error::InvalidBounds(_))
        ));
        assert!(matches!(
            Envelope::bounds(0.0, 5.0, 10.0, -5.0),
            Err(Error::InvalidBounds(_))
        ));
        assert!(Envelope::bounds(f64::NAN, 0.0, 10.0, 10.0).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let envelope = Envelope::new(0.0, 0.0, 10.0, 10.0);
        assert!(envelope.contains_point(&LatLon::new(0.0, 0.0)));
        assert!(envelope.contains_point(&LatLon::new(10.0, 10.0)));
        assert!(!envelope.contains_point(&LatLon::new(10.000001, 5.0)));
        assert!(!envelope.contains_point(&LatLon::new(f64::NAN, 5.0)));
        assert!(envelope.contains(&Envelope::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!envelope.contains(&Envelope::new(-1.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_intersects() {
        let envelope = Envelope::new(0.0, 0.0, 10.0, 10.0);
        assert!(envelope.intersects(&Envelope::new(5.0, 5.0, 15.0, 15.0)));
        // Touching edges count
        assert!(envelope.intersects(&Envelope::new(10.0, 10.0, 15.0, 15.0)));
        assert!(!envelope.intersects(&Envelope::new(10.5, 0.0, 15.0, 15.0)));
        assert!(!envelope.intersects(&Envelope::new(0.0, -20.0, 10.0, -10.5)));
    }

    #[test]
    fn test_quantized() {
        let point = LatLon::new(45.123456789, -121.987654321).quantized();
        assert_eq!(point.latitude, 45.123456789f32 as f64);
        assert_eq!(point.longitude, -121.987654321f32 as f64);
    }
}
