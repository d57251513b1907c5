//! Archive format for time zone boundary snapshots.
//!
//! An archive is a tar stream of named blobs, optionally wrapped in gzip or
//! zstd. The first entry is an empty version sentinel; every other entry holds
//! one encoded [`GeoRecord`](crate::GeoRecord) and is named after its zone id
//! and bounding envelope, so readers can reject entries outside the region
//! they load without decoding the payload.
//!
//! # Entry Layout
//!
//! ```text
//! +---------------------------------------------+
//! | "Version: 1.0:2024a"            (0 bytes)    |  always first
//! +---------------------------------------------+
//! | "Europe/Berlin/47.27,5.86,55.06,15.04"       |  encoded record
//! +---------------------------------------------+
//! | "Europe/Berlin/54.05,10.9,54.25,11.1"        |  same zone, other region
//! +---------------------------------------------+
//! | ...                                          |
//! +---------------------------------------------+
//! ```

pub mod codec;
mod format;
pub mod reader;
pub mod writer;


pub use codec::{decode_envelope, decode_record, encode_envelope, encode_record};
pub use format::*;
pub use reader::{decompress, read_all_entries, read_entries, MappedArchive};
pub use writer::{write_archive, write_archive_file, write_archive_to_vec};
