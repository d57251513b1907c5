//! Archive builder: GeoJSON features in, ordered archive entries out.
//!
//! Every polygon of every feature becomes its own record, so a zone with many
//! islands is stored as many small entries that loaders can reject one by one.
//!
//! # Example
//!
//! ```ignore
//! use tzmap::builder::ArchiveBuilder;
//! use tzmap::{BuildConfig, Compression};
//!
//! let mut builder = ArchiveBuilder::new(BuildConfig::new("1.0:2024a"));
//! builder.add_geojson(std::fs::File::open("combined.geojson")?)?;
//! let entries = builder.build()?;
//! tzmap::archive::write_archive_file("map.tar.zst".as_ref(), Compression::Zstd, &entries)?;
//! ```

pub mod geojson;
pub mod source;

use std::io::Read;

use rayon::prelude::*;

use crate::archive::{check_version, encode_record, entry_name, ArchiveEntry, FORMAT_VERSION};
use crate::config::BuildConfig;
use crate::geometry::{GeoEngine, GeometryEngine};
use crate::model::{GeoRecord, LatLon};
use crate::Result;

pub use geojson::{parse_feature_collection, SourceFeature, SourceGeometry};
pub use source::{open_source, release_url};

/// Collects source features and turns them into archive entries.
pub struct ArchiveBuilder<E: GeometryEngine = GeoEngine> {
    config: BuildConfig,
    engine: E,
    records: Vec<GeoRecord>,
}

impl ArchiveBuilder<GeoEngine> {
    /// Create a builder backed by the `geo` engine.
    pub fn new(config: BuildConfig) -> Self {
        Self::with_engine(config, GeoEngine::new())
    }
}

impl<E: GeometryEngine> ArchiveBuilder<E> {
    pub fn with_engine(config: BuildConfig, engine: E) -> Self {
        if check_version(&config.map_version, FORMAT_VERSION).is_err() {
            log::warn!(
                "Map version '{}' does not start with format version {}",
                config.map_version,
                FORMAT_VERSION
            );
        }
        Self {
            config,
            engine,
            records: Vec::new(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Number of records collected so far, one per source polygon.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Split a feature into one record per polygon.
    pub fn add_feature(&mut self, feature: SourceFeature) {
        let SourceFeature { zone_id, geometry } = feature;
        for region in geometry.into_regions() {
            let record = GeoRecord::new(zone_id.clone(), vec![region]).without_degenerate_rings();
            self.records.push(record);
        }
    }

    pub fn add_features(&mut self, features: impl IntoIterator<Item = SourceFeature>) {
        for feature in features {
            self.add_feature(feature);
        }
    }

    /// Parse a GeoJSON feature collection and add all of its features.
    ///
    /// Returns the number of features added. Nothing is added if any feature
    /// fails to convert.
    pub fn add_geojson<R: Read>(&mut self, reader: R) -> Result<usize> {
        let features = parse_feature_collection(reader, &self.config.id_property)?;
        let count = features.len();
        self.add_features(features);
        Ok(count)
    }

    /// Repair every record and produce the archive entries, sentinel first.
    ///
    /// Any repair failure aborts the whole build.
    pub fn build(&self) -> Result<Vec<ArchiveEntry>> {
        let repaired: Vec<GeoRecord> = if self.config.parallel {
            self.records
                .par_iter()
                .map(|record| self.repair(record))
                .collect::<Result<_>>()?
        } else {
            self.records
                .iter()
                .map(|record| self.repair(record))
                .collect::<Result<_>>()?
        };

        let mut entries = Vec::with_capacity(repaired.len() + 1);
        entries.push(ArchiveEntry::version_sentinel(&self.config.map_version));

        let mut dropped = 0;
        for record in &repaired {
            let Some(envelope) = record.envelope() else {
                dropped += 1;
                continue;
            };
            entries.push(ArchiveEntry::new(
                entry_name(&record.id, &envelope),
                encode_record(record)?,
            ));
        }

        log::info!(
            "Built {} entries from {} records ({} dropped as empty)",
            entries.len() - 1,
            self.records.len(),
            dropped
        );
        Ok(entries)
    }

    /// Repair a record's regions, keeping every resulting piece.
    ///
    /// Repaired coordinates are rounded back to archive precision so the
    /// entry envelope matches the stored points exactly.
    fn repair(&self, record: &GeoRecord) -> Result<GeoRecord> {
        let mut regions = Vec::new();
        for region in &record.regions {
            for mut piece in self.engine.simplify_repair(region)? {
                piece
                    .iter_mut()
                    .flatten()
                    .for_each(|point: &mut LatLon| *point = point.quantized());
                regions.push(piece);
            }
        }
        Ok(GeoRecord::new(record.id.clone(), regions).without_degenerate_rings())
    }
}

/// Read a source and build its entries in one go.
pub fn build_from_source(location: &str, config: BuildConfig) -> Result<Vec<ArchiveEntry>> {
    let content = open_source(location)?;
    let mut builder = ArchiveBuilder::new(config);
    let features = builder.add_geojson(content.as_slice())?;
    log::info!("Loaded {} features ({} records)", features, builder.record_count());
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{decode_record, envelope_from_entry_name, parse_version_entry};
    use crate::model::Region;
    use crate::Error;

    fn square(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Region {
        vec![vec![
            LatLon::new(min_lat, min_lon),
            LatLon::new(min_lat, max_lon),
            LatLon::new(max_lat, max_lon),
            LatLon::new(max_lat, min_lon),
        ]]
    }

    fn feature(zone_id: &str, geometry: SourceGeometry) -> SourceFeature {
        SourceFeature {
            zone_id: zone_id.to_string(),
            geometry,
        }
    }

    fn sample_builder(config: BuildConfig) -> ArchiveBuilder {
        let mut builder = ArchiveBuilder::new(config);
        builder.add_feature(feature("Zone/A", SourceGeometry::Polygon(square(0.0, 0.0, 4.0, 4.0))));
        builder.add_feature(feature(
            "Zone/B",
            SourceGeometry::MultiPolygon(vec![square(10.0, 10.0, 11.0, 11.0), square(20.0, 20.0, 21.5, 22.0)]),
        ));
        builder
    }

    #[test]
    fn test_multi_polygon_splits_into_records() {
        let builder = sample_builder(BuildConfig::new("1.0:test"));
        assert_eq!(builder.record_count(), 3);
    }

    #[test]
    fn test_sentinel_first_and_names_match_payloads() {
        let entries = sample_builder(BuildConfig::new("1.0:test")).build().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(parse_version_entry(&entries[0].name), "1.0:test");
        assert!(entries[0].payload.is_empty());

        for entry in &entries[1..] {
            let record = decode_record(&entry.payload).unwrap();
            assert!(entry.name.starts_with(&format!("{}/", record.id)));
            assert_eq!(envelope_from_entry_name(&entry.name).unwrap(), record.envelope().unwrap());
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let parallel = sample_builder(BuildConfig::new("1.0:test")).build().unwrap();
        let sequential = sample_builder(BuildConfig::new("1.0:test").sequential()).build().unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_degenerate_ring_is_dropped() {
        let mut builder = ArchiveBuilder::new(BuildConfig::new("1.0:test"));
        let mut with_empty_hole = square(0.0, 0.0, 4.0, 4.0);
        with_empty_hole.push(Vec::new());
        builder.add_feature(feature("Zone/Holey", SourceGeometry::Polygon(with_empty_hole)));
        builder.add_feature(feature("Zone/Empty", SourceGeometry::Polygon(vec![Vec::new()])));

        let entries = builder.build().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.name.starts_with("Zone/Empty")));

        let record = decode_record(&entries[1].payload).unwrap();
        assert_eq!(record.id, "Zone/Holey");
        assert!(record.regions.iter().flatten().all(|ring| !ring.is_empty()));
    }

    #[test]
    fn test_sliver_only_record_is_dropped() {
        let mut builder = ArchiveBuilder::new(BuildConfig::new("1.0:test"));
        let line = vec![vec![LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0), LatLon::new(2.0, 2.0)]];
        builder.add_feature(feature("Zone/Line", SourceGeometry::Polygon(line)));

        let entries = builder.build().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_repair_failure_aborts_build() {
        let mut builder = ArchiveBuilder::new(BuildConfig::new("1.0:test"));
        builder.add_feature(feature("Zone/A", SourceGeometry::Polygon(square(0.0, 0.0, 1.0, 1.0))));
        let mut broken = square(0.0, 0.0, 1.0, 1.0);
        broken[0][1].latitude = f64::NAN;
        builder.add_feature(feature("Zone/Broken", SourceGeometry::Polygon(broken)));

        assert!(matches!(builder.build(), Err(Error::Geometry(_))));
    }

    #[test]
    fn test_add_geojson_rejects_unsupported_geometry() {
        let collection = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "tzid": "Zone/A" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "tzid": "Zone/P" },
                    "geometry": { "type": "Point", "coordinates": [0, 0] }
                }
            ]
        }"#;
        let mut builder = ArchiveBuilder::new(BuildConfig::new("1.0:test"));

        assert!(matches!(
            builder.add_geojson(collection.as_bytes()),
            Err(Error::UnsupportedGeometry(_))
        ));
        assert_eq!(builder.record_count(), 0);
    }
}
