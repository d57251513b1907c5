//! Builder input acquisition.
//!
//! A source is either a local GeoJSON file or a timezone-boundary-builder
//! release tag. Zip and gzip wrappers are removed before parsing.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;

use crate::archive::GZIP_MAGIC;
use crate::{Error, Result};

/// Base URL of timezone-boundary-builder releases.
pub const RELEASE_URL_BASE: &str = "https://github.com/evansiroky/timezone-boundary-builder/releases/download";

/// Release asset holding the boundaries, including ocean zones.
pub const RELEASE_ASSET: &str = "timezones-with-oceans.geojson.zip";

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Download URL of a release tag, e.g. `2024a`.
pub fn release_url(tag: &str) -> String {
    format!("{}/{}/{}", RELEASE_URL_BASE, tag, RELEASE_ASSET)
}

/// Fetch the GeoJSON text for a source.
///
/// An existing path is read from disk; anything else is treated as a
/// release tag (or a full `http(s)` URL) and downloaded.
pub fn open_source(location: &str) -> Result<Vec<u8>> {
    let path = Path::new(location);
    let raw = if path.is_file() {
        log::info!("Reading source file {:?}", path);
        fs::read(path)?
    } else {
        let url = if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            release_url(location)
        };
        download(&url)?
    };
    unwrap_source(raw)
}

fn download(url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    let data = response.bytes()?.to_vec();
    log::info!("Downloaded {} bytes", data.len());
    Ok(data)
}

/// Strip a zip or gzip wrapper. Plain content is returned as is.
///
/// Zip sources use their first `.geojson`/`.json` entry, or the first entry
/// when none is named that way.
pub fn unwrap_source(raw: Vec<u8>) -> Result<Vec<u8>> {
    if raw.starts_with(&ZIP_MAGIC) {
        let mut archive = zip::ZipArchive::new(Cursor::new(raw))?;
        let name = archive
            .file_names()
            .find(|n| {
                let lower = n.to_ascii_lowercase();
                lower.ends_with(".geojson") || lower.ends_with(".json")
            })
            .map(str::to_owned);

        let mut file = match name {
            Some(name) => archive.by_name(&name)?,
            None if !archive.is_empty() => archive.by_index(0)?,
            None => return Err(Error::Format("zip source has no entries".to_string())),
        };
        log::debug!("Using zip entry {}", file.name());

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        return Ok(data);
    }

    if raw.starts_with(&GZIP_MAGIC) {
        let mut data = Vec::new();
        GzDecoder::new(raw.as_slice()).read_to_end(&mut data)?;
        return Ok(data);
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const CONTENT: &[u8] = br#"{"type":"FeatureCollection","features":[]}"#;

    #[test]
    fn test_release_url() {
        assert_eq!(
            release_url("2024a"),
            "https://github.com/evansiroky/timezone-boundary-builder/releases/download/2024a/timezones-with-oceans.geojson.zip"
        );
    }

    #[test]
    fn test_plain_content_passes_through() {
        assert_eq!(unwrap_source(CONTENT.to_vec()).unwrap(), CONTENT);
    }

    #[test]
    fn test_gzip_is_unwrapped() {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(CONTENT).unwrap();
        let gz = encoder.finish().unwrap();

        assert_eq!(unwrap_source(gz).unwrap(), CONTENT);
    }

    #[test]
    fn test_zip_prefers_geojson_entry() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("README.txt", options).unwrap();
        writer.write_all(b"not it").unwrap();
        writer.start_file("combined-with-oceans.json", options).unwrap();
        writer.write_all(CONTENT).unwrap();
        let zipped = writer.finish().unwrap().into_inner();

        assert_eq!(unwrap_source(zipped).unwrap(), CONTENT);
    }

    #[test]
    fn test_open_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.geojson");
        fs::write(&path, CONTENT).unwrap();

        assert_eq!(open_source(path.to_str().unwrap()).unwrap(), CONTENT);
    }
}
