//! Archive format constants, entry naming and compression kinds.

use std::fmt;
use std::str::FromStr;

use super::codec::{decode_envelope, encode_envelope};
use crate::model::Envelope;
use crate::{Error, Result};

/// Current archive format version.
///
/// Version labels look like `<format>:<data>`, e.g. `1.0:2024a`. Only the
/// part before the first colon has to match when loading.
pub const FORMAT_VERSION: &str = "1.0";

/// Prefix of the sentinel entry's name.
pub const VERSION_PREFIX: &str = "Version: ";

/// Separator between the zone id and the envelope token in entry names.
pub const NAME_SEPARATOR: char = '/';

/// Zstandard frame magic.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Gzip member magic.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Zstandard level used for archives.
pub const ZSTD_LEVEL: i32 = 19;

/// One named blob inside the archive container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub payload: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// The empty-payload entry that always comes first.
    pub fn version_sentinel(map_version: &str) -> Self {
        Self::new(version_entry_name(map_version), Vec::new())
    }
}

/// Name of the sentinel entry for a version label.
pub fn version_entry_name(map_version: &str) -> String {
    format!("{}{}", VERSION_PREFIX, map_version)
}

/// Extract the version label from the sentinel entry's name.
///
/// Names without the `Version: ` prefix are taken as the label itself.
pub fn parse_version_entry(name: &str) -> &str {
    name.strip_prefix(VERSION_PREFIX).unwrap_or(name).trim()
}

/// Check the format part of a version label against the expected format version.
pub fn check_version(version: &str, expected: &str) -> Result<()> {
    let format = version.split(':').next().unwrap_or_default();
    if format != expected {
        return Err(Error::IncompatibleVersion {
            found: version.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

/// Name of an ordinary entry: `<id>/<envelope token>`.
pub fn entry_name(id: &str, envelope: &Envelope) -> String {
    format!("{}{}{}", id, NAME_SEPARATOR, encode_envelope(envelope))
}

/// Decode the envelope token after the last `/` of an entry name.
pub fn envelope_from_entry_name(name: &str) -> Result<Envelope> {
    let token = name
        .rsplit_once(NAME_SEPARATOR)
        .map(|(_, token)| token)
        .ok_or_else(|| Error::Format(format!("entry name has no envelope: {}", name)))?;
    decode_envelope(token)
}

/// Compression filter wrapped around the tar container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Plain tar
    None,
    /// Gzip (flate2)
    Gzip,
    /// Zstandard
    #[default]
    Zstd,
}

impl Compression {
    /// Sniff the compression of an archive from its leading bytes.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&ZSTD_MAGIC) {
            Compression::Zstd
        } else if data.starts_with(&GZIP_MAGIC) {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "uncompressed",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        }
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uncompressed" | "none" | "tar" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            other => Err(Error::Config(format!(
                "unknown compression '{}', expected uncompressed, gzip or zstd",
                other
            ))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_entry_round_trip() {
        let name = version_entry_name("3.1:2018i");
        assert_eq!(name, "Version: 3.1:2018i");
        assert_eq!(parse_version_entry(&name), "3.1:2018i");
        assert_eq!(parse_version_entry("3.1:2018i"), "3.1:2018i");
    }

    #[test]
    fn test_check_version() {
        assert!(check_version("3.1:2018i", "3.1").is_ok());
        assert!(check_version("3.1", "3.1").is_ok());

        match check_version("3.1:2018i", "4.0") {
            Err(Error::IncompatibleVersion { found, expected }) => {
                assert_eq!(found, "3.1:2018i");
                assert_eq!(expected, "4.0");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(check_version("3.10:2018i", "3.1").is_err());
    }

    #[test]
    fn test_entry_name_carries_envelope() {
        let envelope = Envelope::new(-54.93, -68.5, -54.1, -66.25);
        let name = entry_name("America/Argentina/Ushuaia", &envelope);

        assert!(name.starts_with("America/Argentina/Ushuaia/"));
        assert_eq!(envelope_from_entry_name(&name).unwrap(), envelope);
    }

    #[test]
    fn test_entry_name_without_envelope() {
        assert!(matches!(
            envelope_from_entry_name("Europe/Berlin"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            envelope_from_entry_name("no-separator"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_version_sentinel_is_empty() {
        let entry = ArchiveEntry::version_sentinel("1.0:2024a");
        assert_eq!(entry.name, "Version: 1.0:2024a");
        assert!(entry.payload.is_empty());
    }

    #[test]
    fn test_compression_from_str() {
        assert_eq!("uncompressed".parse::<Compression>().unwrap(), Compression::None);
        assert_eq!("ZSTD".parse::<Compression>().unwrap(), Compression::Zstd);
        assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gzip);
        assert!("lz4".parse::<Compression>().is_err());
    }

    #[test]
    fn test_compression_detect() {
        assert_eq!(Compression::detect(&[0x28, 0xB5, 0x2F, 0xFD, 0]), Compression::Zstd);
        assert_eq!(Compression::detect(&[0x1F, 0x8B, 8]), Compression::Gzip);
        assert_eq!(Compression::detect(b"Version: 1.0"), Compression::None);
        assert_eq!(Compression::detect(&[]), Compression::None);
    }
}
