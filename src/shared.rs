//! Hot-swappable time zone map.
//!
//! [`SharedTimeZoneMap`] holds the current index behind an `ArcSwap`. Readers
//! take cheap snapshots; a reload builds a complete new index first and then
//! swaps it in, so queries never observe a half-loaded map.

use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::MapConfig;
use crate::map::TimeZoneMap;
use crate::model::Envelope;
use crate::Result;

/// Atomically replaceable [`TimeZoneMap`] reference.
///
/// # Example
///
/// ```ignore
/// use tzmap::{Envelope, SharedTimeZoneMap, TimeZoneMap};
///
/// let shared = SharedTimeZoneMap::new(TimeZoneMap::open("map.tar.zst", Envelope::everywhere())?);
/// let zone = shared.zone_id_at(52.52, 13.40)?;
///
/// // Later, pick up a newer archive
/// shared.reload_from_path("map-2024b.tar.zst")?;
/// ```
pub struct SharedTimeZoneMap {
    inner: ArcSwap<TimeZoneMap>,
    /// Incremented on every swap.
    generation: AtomicU64,
    config: MapConfig,
}

impl SharedTimeZoneMap {
    pub fn new(map: TimeZoneMap) -> Self {
        Self::with_config(map, MapConfig::default())
    }

    /// Wrap a map, using `config` for later reloads.
    pub fn with_config(map: TimeZoneMap, config: MapConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(map),
            generation: AtomicU64::new(0),
            config,
        }
    }

    /// Open an archive file and wrap the resulting map.
    pub fn open(path: impl AsRef<Path>, bounds: Envelope) -> Result<Self> {
        Ok(Self::new(TimeZoneMap::open(path, bounds)?))
    }

    /// The current map. Stays valid after later swaps.
    pub fn snapshot(&self) -> Arc<TimeZoneMap> {
        self.inner.load_full()
    }

    /// Swap in a new map.
    pub fn replace(&self, map: TimeZoneMap) {
        self.inner.store(Arc::new(map));
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Load an archive for the current map's region and swap it in.
    ///
    /// On failure the current map stays in place.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bounds = *self.inner.load().initialized_region();
        let map = TimeZoneMap::open_with_config(path, bounds, &self.config)?;
        self.replace(map);
        log::info!("Hot reloaded time zone map from {:?}", path);
        Ok(())
    }

    /// Number of swaps since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Identifier of the smallest zone containing the point.
    pub fn zone_id_at(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let map = self.inner.load();
        let zone_id = map
            .overlapping_time_zone(latitude, longitude)?
            .map(|zone| zone.zone_id().to_string());
        Ok(zone_id)
    }

    /// Identifiers of every zone containing the point, smallest first.
    pub fn zone_ids_at(&self, latitude: f64, longitude: f64) -> Result<Vec<String>> {
        let map = self.inner.load();
        let zone_ids = map
            .overlapping_time_zones(latitude, longitude)?
            .map(|zone| zone.zone_id().to_string())
            .collect();
        Ok(zone_ids)
    }
}
