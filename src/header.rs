//! File metadata: the signature, the header entry table, and the finish line.
//!
//! A CTRK file opens with the ASCII signature `HEAD`, followed by a region of
//! variable-length header entries starting at byte 0x34. Each entry is
//! `[u32 LE size][u8 name length][name][value]`; the first offset that fails
//! those constraints is where the record data section begins. The finish line,
//! when the logger recorded one, is stored as four tagged little-endian
//! doubles near the top of the file.

use crate::{Error, FinishLine, GeoPoint, Result};
use byteorder::{ByteOrder, LittleEndian};

/// The four-byte signature at the start of every CTRK file.
pub const MAGIC: [u8; 4] = *b"HEAD";

/// Byte offset of the first header entry.
const ENTRY_TABLE_START: usize = 0x34;

/// Header entries and finish-line tags both live inside this prefix.
const SCAN_LIMIT: usize = 500;

/// Inclusive bounds on a header entry's size field.
const ENTRY_SIZE_RANGE: std::ops::RangeInclusive<usize> = 5..=200;

const P1_LAT: &[u8] = b"RECORDLINE.P1.LAT(";
const P1_LNG: &[u8] = b"RECORDLINE.P1.LNG(";
const P2_LAT: &[u8] = b"RECORDLINE.P2.LAT(";
const P2_LNG: &[u8] = b"RECORDLINE.P2.LNG(";

/// The decoded file header.
///
/// # Examples
///
/// ```
/// use ctrk::Header;
///
/// let mut data = vec![0; 0x34];
/// data[0..4].copy_from_slice(b"HEAD");
/// let header = Header::read_from(&data).unwrap();
/// assert_eq!(0x34, header.data_start());
/// assert!(header.finish_line().is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    finish_line: Option<FinishLine>,
    data_start: usize,
}

impl Header {
    /// Reads a header from the front of a file's bytes.
    ///
    /// Returns [Error::InvalidMagic] if the signature is not `HEAD`, and
    /// [Error::HeaderTooShort] if the input ends inside the header region.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::Header;
    ///
    /// assert!(Header::read_from(b"LASF").is_err());
    /// ```
    pub fn read_from(data: &[u8]) -> Result<Header> {
        if data.len() < MAGIC.len() {
            return Err(Error::HeaderTooShort(data.len()));
        }
        if data[0..4] != MAGIC {
            let mut signature = [0; 4];
            signature.copy_from_slice(&data[0..4]);
            return Err(Error::InvalidMagic(signature));
        }
        if data.len() < ENTRY_TABLE_START {
            return Err(Error::HeaderTooShort(data.len()));
        }
        Ok(Header {
            finish_line: read_finish_line(data),
            data_start: find_data_start(data),
        })
    }

    /// Returns the finish line, if the header carries all four tags.
    pub fn finish_line(&self) -> Option<&FinishLine> {
        self.finish_line.as_ref()
    }

    /// Returns the byte offset at which the record data section begins.
    pub fn data_start(&self) -> usize {
        self.data_start
    }
}

/// Walks the header entry table until an entry violates the constraints.
fn find_data_start(data: &[u8]) -> usize {
    let limit = data.len().min(SCAN_LIMIT);
    let mut offset = ENTRY_TABLE_START;
    while offset < limit {
        if offset + 5 > data.len() {
            break;
        }
        let entry_size = LittleEndian::read_u32(&data[offset..]) as usize;
        if !ENTRY_SIZE_RANGE.contains(&entry_size) {
            break;
        }
        let name_len = usize::from(data[offset + 4]);
        if name_len < 1 || name_len > entry_size - 5 {
            break;
        }
        offset += entry_size;
    }
    offset
}

fn read_finish_line(data: &[u8]) -> Option<FinishLine> {
    let prefix = &data[..data.len().min(SCAN_LIMIT)];
    Some(FinishLine {
        p1: GeoPoint {
            lat: tagged_double(prefix, P1_LAT)?,
            lng: tagged_double(prefix, P1_LNG)?,
        },
        p2: GeoPoint {
            lat: tagged_double(prefix, P2_LAT)?,
            lng: tagged_double(prefix, P2_LNG)?,
        },
    })
}

/// Finds `tag` and reads the little-endian double that follows it.
fn tagged_double(data: &[u8], tag: &[u8]) -> Option<f64> {
    let position = data.windows(tag.len()).position(|window| window == tag)?;
    let start = position + tag.len();
    if start + 8 > data.len() {
        return None;
    }
    Some(LittleEndian::read_f64(&data[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_header() -> Vec<u8> {
        let mut data = vec![0; ENTRY_TABLE_START];
        data[0..4].copy_from_slice(&MAGIC);
        data
    }

    fn entry(name: &[u8], value: &[u8]) -> Vec<u8> {
        let size = 5 + name.len() + value.len();
        let mut bytes = Vec::with_capacity(size);
        bytes.extend_from_slice(&(size as u32).to_le_bytes());
        bytes.push(name.len() as u8);
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(value);
        bytes
    }

    #[test]
    fn invalid_magic() {
        assert!(matches!(
            Header::read_from(b"LASF"),
            Err(Error::InvalidMagic(_))
        ));
    }

    #[test]
    fn too_short() {
        assert!(matches!(
            Header::read_from(b"HE"),
            Err(Error::HeaderTooShort(2))
        ));
        assert!(matches!(
            Header::read_from(b"HEADER"),
            Err(Error::HeaderTooShort(6))
        ));
    }

    #[test]
    fn data_starts_after_entries() {
        let mut data = empty_header();
        let entry = entry(b"LOGGER.NAME(", b"R1M");
        data.extend_from_slice(&entry);
        data.extend_from_slice(&[0xff; 8]);
        let header = Header::read_from(&data).unwrap();
        assert_eq!(ENTRY_TABLE_START + entry.len(), header.data_start());
    }

    #[test]
    fn finish_line_from_tags() {
        let mut data = empty_header();
        for (tag, value) in [
            (P1_LAT, 35.2_f64),
            (P1_LNG, 139.5),
            (P2_LAT, 35.3),
            (P2_LNG, 139.6),
        ] {
            let mut bytes = tag.to_vec();
            bytes.extend_from_slice(&value.to_le_bytes());
            data.extend_from_slice(&entry(&bytes, &[]));
        }
        let header = Header::read_from(&data).unwrap();
        let finish_line = header.finish_line().unwrap();
        assert_eq!(35.2, finish_line.p1.lat);
        assert_eq!(139.6, finish_line.p2.lng);
    }

    #[test]
    fn missing_tag_disables_finish_line() {
        let mut data = empty_header();
        let mut bytes = P1_LAT.to_vec();
        bytes.extend_from_slice(&35.2_f64.to_le_bytes());
        data.extend_from_slice(&entry(&bytes, &[]));
        let header = Header::read_from(&data).unwrap();
        assert!(header.finish_line().is_none());
    }
}
