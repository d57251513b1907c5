//! tzmap - Offline time zone lookup by coordinates.
//!
//! This crate answers "which time zone covers this point?" from a compact
//! archive of time zone boundary polygons, without any network access at
//! query time.
//!
//! # Features
//!
//! - **Region loading**: load the whole world or only the zones overlapping a
//!   rectangle; entries outside it are rejected by name without decoding
//! - **Deterministic overlaps**: overlapping zones are answered smallest
//!   area first
//! - **Boundary distance**: geodesic distance from a point to its zone's edge
//! - **Archive builder**: GeoJSON (e.g. timezone-boundary-builder releases)
//!   to a versioned tar archive, optionally gzip or zstd compressed
//! - **Hot reload**: swap in a newer archive while queries keep running
//!
//! # Quick Start
//!
//! ```ignore
//! use tzmap::{Envelope, TimeZoneMap};
//!
//! let map = TimeZoneMap::open("timezones.tar.zst", Envelope::everywhere())?;
//!
//! if let Some(zone) = map.overlapping_time_zone(52.52, 13.40)? {
//!     println!("{}", zone.zone_id()); // Europe/Berlin
//! }
//!
//! // Only Europe, loads much faster
//! let europe = TimeZoneMap::open("timezones.tar.zst", Envelope::bounds(34.0, -25.0, 72.0, 45.0)?)?;
//! ```
//!
//! # Building Archives
//!
//! ```ignore
//! use tzmap::builder::build_from_source;
//! use tzmap::{archive, BuildConfig, Compression};
//!
//! let entries = build_from_source("2024a", BuildConfig::new("1.0:2024a"))?;
//! archive::write_archive_file("timezones.tar.zst".as_ref(), Compression::Zstd, &entries)?;
//! ```
//!
//! The `tzmap-gen` binary wraps the same steps:
//!
//! ```text
//! tzmap-gen 2024a 1.0:2024a zstd timezones.tar.zst gzip timezones.tar.gz
//! ```

mod error;
mod global;
mod model;
mod shared;

pub mod archive;
pub mod builder;
pub mod config;
pub mod geometry;
pub mod map;

// Re-export core types
pub use error::{Error, Result};
pub use model::{Envelope, GeoRecord, LatLon, Region, Ring};

// Re-export index types
pub use map::{TimeZone, TimeZoneMap};
pub use shared::SharedTimeZoneMap;

// Re-export configuration
pub use archive::{Compression, FORMAT_VERSION};
pub use config::{BuildConfig, MapConfig};
pub use geometry::{GeoEngine, GeometryEngine};

// Re-export global API functions
pub use global::{
    ensure_initialized, global_map, init_global_map, init_global_map_for_region, is_initialized,
    set_global_map, zone_id_at,
};
