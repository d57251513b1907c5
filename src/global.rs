//! Process-wide default map.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::{Arc, Once};

use crate::config::ARCHIVE_PATH_ENV;
use crate::error::{Error, Result};
use crate::map::TimeZoneMap;
use crate::model::Envelope;

/// Global map
static GLOBAL_MAP: Lazy<RwLock<Option<Arc<TimeZoneMap>>>> = Lazy::new(|| RwLock::new(None));

/// Initialization flag
static INIT: Once = Once::new();

/// Ensure the global map is initialized.
///
/// On first call, loads the archive named by `TZMAP_ARCHIVE` for the whole
/// world unless a map was already installed. Failures are logged; queries
/// then report [`Error::NotInitialized`].
pub fn ensure_initialized() {
    INIT.call_once(|| {
        if is_initialized() {
            return;
        }
        match std::env::var_os(ARCHIVE_PATH_ENV) {
            Some(path) => {
                if let Err(e) = init_global_map(&path) {
                    log::error!("Failed to load time zone map from {:?}: {}", path, e);
                }
            }
            None => log::debug!("{} not set, global map stays empty", ARCHIVE_PATH_ENV),
        }
    });
}

/// Check if the global map is initialized.
pub fn is_initialized() -> bool {
    GLOBAL_MAP.read().is_some()
}

/// Load an archive file for the whole world into the global map.
pub fn init_global_map(path: impl AsRef<Path>) -> Result<()> {
    init_global_map_for_region(path, Envelope::everywhere())
}

/// Load the part of an archive file overlapping `bounds` into the global map.
pub fn init_global_map_for_region(path: impl AsRef<Path>, bounds: Envelope) -> Result<()> {
    let map = TimeZoneMap::open(path.as_ref(), bounds)?;
    set_global_map(map);
    log::debug!("Initialized global map from {:?}", path.as_ref());
    Ok(())
}

/// Install an already loaded map as the global map.
pub fn set_global_map(map: TimeZoneMap) {
    *GLOBAL_MAP.write() = Some(Arc::new(map));
}

/// The current global map, if any.
pub fn global_map() -> Option<Arc<TimeZoneMap>> {
    ensure_initialized();
    GLOBAL_MAP.read().clone()
}

/// Look up the zone identifier at a point in the global map.
///
/// # Examples
/// ```ignore
/// std::env::set_var("TZMAP_ARCHIVE", "/var/lib/tzmap/map.tar.zst");
/// let zone = tzmap::zone_id_at(52.52, 13.40)?;
/// assert_eq!(zone.as_deref(), Some("Europe/Berlin"));
/// ```
pub fn zone_id_at(latitude: f64, longitude: f64) -> Result<Option<String>> {
    let map = global_map().ok_or(Error::NotInitialized)?;
    let zone = map.overlapping_time_zone(latitude, longitude)?;
    Ok(zone.map(|zone| zone.zone_id().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{write_archive_to_vec, ArchiveEntry, Compression};
    use crate::builder::{ArchiveBuilder, SourceFeature, SourceGeometry};
    use crate::config::BuildConfig;
    use crate::model::LatLon;

    fn entries() -> Vec<ArchiveEntry> {
        let mut builder = ArchiveBuilder::new(BuildConfig::new("1.0:global").sequential());
        builder.add_feature(SourceFeature {
            zone_id: "Zone/Global".to_string(),
            geometry: SourceGeometry::Polygon(vec![vec![
                LatLon::new(-10.0, -10.0),
                LatLon::new(-10.0, 10.0),
                LatLon::new(10.0, 10.0),
                LatLon::new(10.0, -10.0),
            ]]),
        });
        builder.build().unwrap()
    }

    #[test]
    fn test_global_map_lookup() {
        let data = write_archive_to_vec(Compression::None, &entries()).unwrap();
        set_global_map(TimeZoneMap::for_everywhere(data.as_slice()).unwrap());

        assert!(is_initialized());
        assert_eq!(zone_id_at(1.0, 1.0).unwrap().as_deref(), Some("Zone/Global"));
        assert_eq!(zone_id_at(50.0, 50.0).unwrap(), None);
        assert!(matches!(zone_id_at(95.0, 0.0), Err(Error::OutOfBounds { .. })));
        assert_eq!(global_map().unwrap().map_version(), Some("1.0:global"));
    }
}
