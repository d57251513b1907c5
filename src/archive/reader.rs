//! Archive container reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use memmap2::Mmap;

use super::format::{ArchiveEntry, Compression};
use crate::{Error, Result};

/// Upper bound on buffer space reserved from an entry's header size.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Wrap archive bytes in the decompressor matching their magic bytes.
pub fn decompress<'a>(data: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    Ok(match Compression::detect(data) {
        Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(data)?),
        Compression::Gzip => Box::new(GzDecoder::new(data)),
        Compression::None => Box::new(data),
    })
}

/// A memory-mapped archive file.
pub struct MappedArchive {
    mmap: Mmap,
}

impl MappedArchive {
    /// Map an archive file into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    pub fn compression(&self) -> Compression {
        Compression::detect(&self.mmap)
    }

    /// Decompressed tar stream over the mapped bytes.
    pub fn reader(&self) -> Result<Box<dyn Read + '_>> {
        decompress(&self.mmap)
    }
}

/// Scan a (decompressed) tar stream entry by entry.
///
/// `accept` sees each entry's name and size before its payload is read.
/// Payloads are only loaded for entries it accepts; the rest are skipped.
/// Errors returned by `accept` abort the scan.
pub fn read_entries<R, F>(reader: R, mut accept: F) -> Result<Vec<ArchiveEntry>>
where
    R: Read,
    F: FnMut(&str, u64) -> Result<bool>,
{
    let mut archive = tar::Archive::new(reader);
    let mut accepted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = String::from_utf8(entry.path_bytes().into_owned())
            .map_err(|_| Error::Format("archive entry name is not UTF-8".to_string()))?;
        let size = entry.size();

        if !accept(&name, size)? {
            continue;
        }

        let mut payload = Vec::with_capacity(size.min(MAX_PREALLOCATION) as usize);
        entry.read_to_end(&mut payload)?;
        accepted.push(ArchiveEntry { name, payload });
    }

    Ok(accepted)
}

/// Read every entry of a (decompressed) tar stream.
pub fn read_all_entries<R: Read>(reader: R) -> Result<Vec<ArchiveEntry>> {
    read_entries(reader, |_, _| Ok(true))
}
