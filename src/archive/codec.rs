//! Binary record codec and textual envelope tokens.
//!
//! # Record layout (little-endian)
//!
//! ```text
//! u16 id_len | id (UTF-8)
//! u32 region_count
//!   u32 ring_count                      (per region)
//!     u32 point_count                   (per ring)
//!       f32 latitude | f32 longitude    (per point)
//! ```
//!
//! Coordinates are stored in single precision. Rings keep their point order.

use crate::model::{Envelope, GeoRecord, LatLon, Region, Ring};
use crate::{Error, Result};

/// Bytes per stored point.
const POINT_SIZE: usize = 8;

/// Serialize an envelope as `min_lat,min_lon,max_lat,max_lon`.
///
/// `f64` display output is the shortest string that parses back to the same
/// value, so the token is lossless.
pub fn encode_envelope(envelope: &Envelope) -> String {
    format!(
        "{},{},{},{}",
        envelope.min_latitude(),
        envelope.min_longitude(),
        envelope.max_latitude(),
        envelope.max_longitude()
    )
}

/// Parse a token written by [`encode_envelope`].
pub fn decode_envelope(token: &str) -> Result<Envelope> {
    let values = token
        .split(',')
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::Format(format!("invalid envelope field '{}' in '{}'", field, token)))
        })
        .collect::<Result<Vec<f64>>>()?;

    match values.as_slice() {
        [min_lat, min_lon, max_lat, max_lon] => {
            Ok(Envelope::new(*min_lat, *min_lon, *max_lat, *max_lon))
        }
        _ => Err(Error::Format(format!(
            "envelope needs 4 fields, got {}: '{}'",
            values.len(),
            token
        ))),
    }
}

/// Serialize a record into a self-contained blob.
pub fn encode_record(record: &GeoRecord) -> Result<Vec<u8>> {
    let id = record.id.as_bytes();
    let id_len = u16::try_from(id.len())
        .map_err(|_| Error::Format(format!("zone id too long: {} bytes", id.len())))?;

    let mut buffer = Vec::with_capacity(2 + id.len() + 4 + record.point_count() * POINT_SIZE);
    buffer.extend_from_slice(&id_len.to_le_bytes());
    buffer.extend_from_slice(id);

    write_count(&mut buffer, record.regions.len())?;
    for region in &record.regions {
        write_count(&mut buffer, region.len())?;
        for ring in region {
            write_count(&mut buffer, ring.len())?;
            for point in ring {
                buffer.extend_from_slice(&(point.latitude as f32).to_le_bytes());
                buffer.extend_from_slice(&(point.longitude as f32).to_le_bytes());
            }
        }
    }

    Ok(buffer)
}

/// Parse a blob written by [`encode_record`].
pub fn decode_record(data: &[u8]) -> Result<GeoRecord> {
    let mut reader = ByteReader::new(data);

    let id_len = reader.read_u16()? as usize;
    let id = std::str::from_utf8(reader.read_bytes(id_len)?)
        .map_err(|e| Error::Format(format!("zone id is not UTF-8: {}", e)))?
        .to_string();

    let region_count = reader.read_count(4)?;
    let mut regions = Vec::with_capacity(region_count);
    for _ in 0..region_count {
        let ring_count = reader.read_count(4)?;
        let mut region: Region = Vec::with_capacity(ring_count);
        for _ in 0..ring_count {
            let point_count = reader.read_count(POINT_SIZE)?;
            let mut ring: Ring = Vec::with_capacity(point_count);
            for _ in 0..point_count {
                let latitude = reader.read_f32()? as f64;
                let longitude = reader.read_f32()? as f64;
                ring.push(LatLon::new(latitude, longitude));
            }
            region.push(ring);
        }
        regions.push(region);
    }

    if reader.remaining() != 0 {
        return Err(Error::Format(format!(
            "{} trailing bytes after record '{}'",
            reader.remaining(),
            id
        )));
    }

    Ok(GeoRecord { id, regions })
}

fn write_count(buffer: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = u32::try_from(count)
        .map_err(|_| Error::Format(format!("count {} does not fit the record format", count)))?;
    buffer.extend_from_slice(&count.to_le_bytes());
    Ok(())
}

/// Bounds-checked little-endian cursor.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Format(format!(
                "record truncated: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read an element count, rejecting counts the remaining bytes cannot hold.
    fn read_count(&mut self, min_element_size: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_element_size) > self.remaining() {
            return Err(Error::Format(format!(
                "record truncated: {} elements declared at offset {}, {} bytes left",
                count,
                self.pos,
                self.remaining()
            )));
        }
        Ok(count)
    }
}
