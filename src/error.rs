//! Error types for tzmap.

use thiserror::Error;

/// Error type for tzmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Index bounds where a minimum is not below its maximum
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// Archive written for a different format version
    #[error("incompatible map archive: detected version '{found}', required version '{expected}:*'")]
    IncompatibleVersion { found: String, expected: String },

    /// Truncated or malformed payload, envelope token or entry name
    #[error("format error: {0}")]
    Format(String),

    /// Feature geometry that is neither a polygon nor a multi-polygon
    #[error("geometries of type {0} are not supported")]
    UnsupportedGeometry(String),

    /// Query point outside the region the map was initialized for
    #[error("requested point ({latitude}, {longitude}) is outside the initialized area")]
    OutOfBounds { latitude: f64, longitude: f64 },

    /// Distance query for a point that is not inside the zone
    #[error("location ({latitude}, {longitude}) must be inside the time zone")]
    NotContained { latitude: f64, longitude: f64 },

    /// Geometry engine failure
    #[error("geometry error: {0}")]
    Geometry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Global map not initialized
    #[error("time zone map not initialized")]
    NotInitialized,

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),
}

/// Result type alias for tzmap operations.
pub type Result<T> = std::result::Result<T, Error>;
