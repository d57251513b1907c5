//! Configuration for loading and building time zone maps.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::archive::FORMAT_VERSION;
use crate::{Error, Result};

/// Environment variable naming the archive loaded by the global map.
pub const ARCHIVE_PATH_ENV: &str = "TZMAP_ARCHIVE";

/// Default GeoJSON property holding the zone identifier.
pub const DEFAULT_ID_PROPERTY: &str = "tzid";

/// Configuration for loading a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Format version an archive's version label must start with
    pub format_version: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
        }
    }
}

impl MapConfig {
    /// Create a config expecting a specific format version.
    pub fn new(format_version: impl Into<String>) -> Self {
        Self {
            format_version: format_version.into(),
        }
    }
}

/// Configuration for building an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Version label written to the sentinel entry, e.g. `1.0:2024a`
    pub map_version: String,
    /// Repair records on the rayon pool
    pub parallel: bool,
    /// GeoJSON feature property holding the zone identifier
    pub id_property: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            map_version: FORMAT_VERSION.to_string(),
            parallel: true,
            id_property: DEFAULT_ID_PROPERTY.to_string(),
        }
    }
}

impl BuildConfig {
    /// Create a config for a version label with default settings.
    pub fn new(map_version: impl Into<String>) -> Self {
        Self {
            map_version: map_version.into(),
            ..Self::default()
        }
    }

    /// Run repair on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Read the zone identifier from a different property.
    pub fn with_id_property(mut self, property: impl Into<String>) -> Self {
        self.id_property = property.into();
        self
    }

    /// Load a build configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        if config.map_version.trim().is_empty() {
            return Err(Error::Config("map_version must not be empty".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_map_config_default() {
        assert_eq!(MapConfig::default().format_version, FORMAT_VERSION);
        assert_eq!(MapConfig::new("3.1").format_version, "3.1");
    }

    #[test]
    fn test_build_config_builders() {
        let config = BuildConfig::new("1.0:2024a").sequential().with_id_property("zone");
        assert_eq!(config.map_version, "1.0:2024a");
        assert!(!config.parallel);
        assert_eq!(config.id_property, "zone");
    }

    #[test]
    fn test_build_config_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{ "map_version": "1.0:2024b" }"#).unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.map_version, "1.0:2024b");
        assert!(config.parallel);
        assert_eq!(config.id_property, DEFAULT_ID_PROPERTY);
    }

    #[test]
    fn test_build_config_load_rejects_empty_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{ "map_version": "  " }"#).unwrap();
        assert!(matches!(BuildConfig::load(&path), Err(Error::Config(_))));
    }
}
