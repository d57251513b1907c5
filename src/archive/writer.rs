//! Archive container writer.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;

use super::format::{ArchiveEntry, Compression, ZSTD_LEVEL};
use crate::Result;

/// Write entries, in order, as a tar stream through the given compression.
///
/// Returns the underlying writer once the compressor has been finished.
pub fn write_archive<W: Write>(writer: W, compression: Compression, entries: &[ArchiveEntry]) -> Result<W> {
    match compression {
        Compression::None => write_tar(writer, entries),
        Compression::Gzip => {
            let encoder = GzEncoder::new(writer, flate2::Compression::best());
            Ok(write_tar(encoder, entries)?.finish()?)
        }
        Compression::Zstd => {
            let encoder = zstd::stream::write::Encoder::new(writer, ZSTD_LEVEL)?;
            Ok(write_tar(encoder, entries)?.finish()?)
        }
    }
}

/// Write an archive into memory.
pub fn write_archive_to_vec(compression: Compression, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    write_archive(Vec::new(), compression, entries)
}

/// Write an archive file atomically.
///
/// The archive goes to a temporary file next to `path` which is synced and
/// then renamed over `path`, so a failure never leaves a partial archive.
pub fn write_archive_file(path: &Path, compression: Compression, entries: &[ArchiveEntry]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp_file = tempfile::NamedTempFile::new_in(parent)?;
    write_archive(temp_file.as_file(), compression, entries)?.sync_all()?;

    temp_file.persist(path).map_err(|e| e.error)?;

    let size = fs::metadata(path).map(|m| m.len()).unwrap_or_default();
    log::info!(
        "Wrote {} entries to {:?} ({}, {} bytes)",
        entries.len(),
        path,
        compression,
        size
    );
    Ok(())
}

fn write_tar<W: Write>(writer: W, entries: &[ArchiveEntry]) -> Result<W> {
    let mut builder = tar::Builder::new(writer);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.payload.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        // append_data fills in the path (with GNU long-name records) and checksum
        builder.append_data(&mut header, &entry.name, entry.payload.as_slice())?;
    }
    Ok(builder.into_inner()?)
}
