//! Region-loadable time zone index and point queries.
//!
//! Loading runs a staged pipeline over the archive entries:
//!
//! ```text
//! entries -> version check -> name envelope reject -> decode + reify
//!         -> exact extents reject -> area sort -> clip -> index
//! ```
//!
//! Zones are kept sorted by the area of their unclipped geometry, smallest
//! first. That order is the answer order for overlapping zones and never
//! changes after loading.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crate::archive::{
    check_version, decode_record, envelope_from_entry_name, parse_version_entry, read_entries, MappedArchive,
};
use crate::config::MapConfig;
use crate::geometry::{GeoEngine, GeometryEngine};
use crate::model::{Envelope, LatLon};
use crate::{Error, Result};

/// One zone region held by the index.
///
/// A zone identifier usually appears on several `TimeZone`s, one per
/// disjoint region (or clipped fragment).
#[derive(Debug, Clone)]
pub struct TimeZone<G> {
    zone_id: String,
    region: G,
    area: f64,
}

impl<G> TimeZone<G> {
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Engine geometry, clipped to the initialized region when it crossed it.
    pub fn region(&self) -> &G {
        &self.region
    }

    /// Area in square meters of the region before clipping.
    pub fn area(&self) -> f64 {
        self.area
    }
}

/// An immutable time zone index over a rectangular region.
///
/// Safe to share between threads; queries never mutate it. To refresh, load
/// a new map and swap it in (see [`SharedTimeZoneMap`](crate::SharedTimeZoneMap)).
pub struct TimeZoneMap<E: GeometryEngine = GeoEngine> {
    map_version: Option<String>,
    time_zones: Vec<TimeZone<E::Geometry>>,
    initialized_region: Envelope,
    engine: E,
}

impl TimeZoneMap<GeoEngine> {
    /// Load every zone of the world from a decompressed archive stream.
    pub fn for_everywhere<R: Read>(reader: R) -> Result<Self> {
        Self::load_with(reader, Envelope::everywhere(), &MapConfig::default(), GeoEngine::new())
    }

    /// Load the zones overlapping a region from a decompressed archive stream.
    pub fn for_region<R: Read>(
        reader: R,
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Result<Self> {
        let bounds = Envelope::bounds(min_latitude, min_longitude, max_latitude, max_longitude)?;
        Self::load_with(reader, bounds, &MapConfig::default(), GeoEngine::new())
    }

    /// Load an archive file, unwrapping gzip or zstd compression.
    pub fn open(path: impl AsRef<Path>, bounds: Envelope) -> Result<Self> {
        Self::open_with_config(path, bounds, &MapConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, bounds: Envelope, config: &MapConfig) -> Result<Self> {
        let path = path.as_ref();
        let archive = MappedArchive::open(path)?;
        log::debug!("Opening {:?} ({})", path, archive.compression());
        let reader = archive.reader()?;
        let map = Self::load_with(reader, bounds, config, GeoEngine::new())?;
        Ok(map)
    }
}

impl<E: GeometryEngine> TimeZoneMap<E> {
    /// Load the zones overlapping `bounds` with a specific engine.
    ///
    /// Fails without producing a partial index if the bounds are empty, the
    /// archive version does not match `config`, or any accepted entry is
    /// malformed.
    pub fn load_with<R: Read>(reader: R, bounds: Envelope, config: &MapConfig, engine: E) -> Result<Self> {
        bounds.validate_bounds()?;

        let mut map_version = None;
        let mut is_first = true;
        let mut scanned = 0usize;
        let entries = read_entries(reader, |name, size| {
            if is_first {
                is_first = false;
                let version = parse_version_entry(name);
                check_version(version, &config.format_version)?;
                map_version = Some(version.to_string());
                return Ok(false);
            }
            scanned += 1;
            if size == 0 {
                return Ok(false);
            }
            Ok(envelope_from_entry_name(name)?.intersects(&bounds))
        })?;
        log::debug!("{} of {} entries pass the name envelope check", entries.len(), scanned);

        let mut candidates = Vec::with_capacity(entries.len());
        for entry in &entries {
            let record = decode_record(&entry.payload)?;
            let geometry = engine.reify(&record.regions);
            let Some(extents) = engine.extents(&geometry) else {
                continue;
            };
            if !extents.intersects(&bounds) {
                continue;
            }
            let area = engine.area(&geometry);
            candidates.push((record.id, geometry, extents, area));
        }
        log::debug!("{} entries pass the exact extents check", candidates.len());

        // Stable, so equal areas keep archive order.
        candidates.sort_by(|a, b| a.3.total_cmp(&b.3));

        let mut time_zones = Vec::with_capacity(candidates.len());
        for (zone_id, geometry, extents, area) in candidates {
            if bounds.contains(&extents) {
                time_zones.push(TimeZone {
                    zone_id,
                    region: geometry,
                    area,
                });
                continue;
            }
            for fragment in engine.intersect(&geometry, &bounds) {
                time_zones.push(TimeZone {
                    zone_id: zone_id.clone(),
                    region: fragment,
                    area,
                });
            }
        }

        log::info!(
            "Loaded {} time zone regions (version {})",
            time_zones.len(),
            map_version.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            map_version,
            time_zones,
            initialized_region: bounds,
            engine,
        })
    }

    /// Version label of the loaded archive, e.g. `1.0:2024a`.
    ///
    /// `None` only for an archive without any entries.
    pub fn map_version(&self) -> Option<&str> {
        self.map_version.as_deref()
    }

    /// All loaded zone regions, smallest area first.
    pub fn time_zones(&self) -> &[TimeZone<E::Geometry>] {
        &self.time_zones
    }

    pub fn initialized_region(&self) -> &Envelope {
        &self.initialized_region
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Distinct zone identifiers present in the index, sorted.
    pub fn known_zone_ids(&self) -> Vec<&str> {
        self.time_zones
            .iter()
            .map(|zone| zone.zone_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every zone containing the point (boundaries included), smallest area first.
    ///
    /// The returned iterator is lazy and can be cloned to restart it.
    pub fn overlapping_time_zones(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<impl Iterator<Item = &TimeZone<E::Geometry>> + Clone + '_> {
        let point = self.checked_point(latitude, longitude)?;
        Ok(self
            .time_zones
            .iter()
            .filter(move |zone| self.engine.contains_inclusive(&zone.region, point)))
    }

    /// The smallest zone containing the point, if any.
    pub fn overlapping_time_zone(&self, latitude: f64, longitude: f64) -> Result<Option<&TimeZone<E::Geometry>>> {
        Ok(self.overlapping_time_zones(latitude, longitude)?.next())
    }

    /// Geodesic distance in meters from a point inside `zone` to its boundary.
    ///
    /// For maps loaded for a region, the boundary of a clipped zone includes
    /// the clip edge.
    pub fn distance_from_boundary(&self, zone: &TimeZone<E::Geometry>, latitude: f64, longitude: f64) -> Result<f64> {
        let point = LatLon::new(latitude, longitude);
        if !self.engine.contains_inclusive(&zone.region, point) {
            return Err(Error::NotContained { latitude, longitude });
        }
        let nearest = self
            .engine
            .nearest_boundary_point(&zone.region, point)
            .ok_or_else(|| Error::Geometry(format!("zone {} has no boundary", zone.zone_id)))?;
        Ok(self.engine.geodesic_distance(point, nearest))
    }

    fn checked_point(&self, latitude: f64, longitude: f64) -> Result<LatLon> {
        let point = LatLon::new(latitude, longitude);
        if !self.initialized_region.contains_point(&point) {
            return Err(Error::OutOfBounds { latitude, longitude });
        }
        Ok(point)
    }
}
