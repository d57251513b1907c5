//! GeoJSON feature collection ingestion.
//!
//! Geometry kinds are resolved here, once: every feature becomes a
//! [`SourceFeature`] holding either a single polygon or a multi-polygon, and
//! anything else is rejected before the build starts.

use std::io::Read;

use geojson::{Feature, FeatureCollection, PolygonType, Position, Value};

use crate::model::{LatLon, Region, Ring};
use crate::{Error, Result};

/// Geometry of one source feature.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceGeometry {
    /// One polygon: outer ring followed by holes
    Polygon(Region),
    /// Several disjoint polygons, each with its own holes
    MultiPolygon(Vec<Region>),
}

impl SourceGeometry {
    /// The disjoint regions making up this geometry.
    pub fn into_regions(self) -> Vec<Region> {
        match self {
            SourceGeometry::Polygon(region) => vec![region],
            SourceGeometry::MultiPolygon(regions) => regions,
        }
    }
}

/// A zone identifier and its boundary geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    pub zone_id: String,
    pub geometry: SourceGeometry,
}

/// Parse a GeoJSON feature collection.
///
/// `id_property` names the property holding the zone identifier.
pub fn parse_feature_collection<R: Read>(reader: R, id_property: &str) -> Result<Vec<SourceFeature>> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    log::debug!("Parsed {} features", collection.features.len());

    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| convert_feature(index, feature, id_property))
        .collect()
}

/// Parse a GeoJSON feature collection held in a string.
pub fn parse_feature_collection_str(content: &str, id_property: &str) -> Result<Vec<SourceFeature>> {
    parse_feature_collection(content.as_bytes(), id_property)
}

fn convert_feature(index: usize, feature: &Feature, id_property: &str) -> Result<SourceFeature> {
    let zone_id = match feature.property(id_property) {
        Some(serde_json::Value::String(id)) => id.clone(),
        Some(serde_json::Value::Null) | None => {
            return Err(Error::Format(format!(
                "feature {} has no '{}' property",
                index, id_property
            )))
        }
        Some(other) => other.to_string(),
    };

    let geometry = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(polygon)) => SourceGeometry::Polygon(convert_polygon(polygon)?),
        Some(Value::MultiPolygon(polygons)) => SourceGeometry::MultiPolygon(
            polygons.iter().map(convert_polygon).collect::<Result<_>>()?,
        ),
        Some(other) => return Err(Error::UnsupportedGeometry(other.type_name().to_string())),
        None => return Err(Error::UnsupportedGeometry("null".to_string())),
    };

    Ok(SourceFeature { zone_id, geometry })
}

fn convert_polygon(polygon: &PolygonType) -> Result<Region> {
    polygon.iter().map(|ring| convert_ring(ring)).collect()
}

/// GeoJSON positions are `[longitude, latitude, ...]`. Coordinates are
/// rounded to archive precision here so envelopes match stored payloads.
fn convert_ring(ring: &[Position]) -> Result<Ring> {
    ring.iter()
        .map(|position| match position.as_slice() {
            [longitude, latitude, ..] => Ok(LatLon::new(*latitude, *longitude).quantized()),
            _ => Err(Error::Format(format!(
                "position needs at least 2 values, got {}",
                position.len()
            ))),
        })
        .collect()
}
