//! Framed records from the data section.
//!
//! The data section is a concatenation of variable-length records, each with a
//! four-byte header (type and total size, both little-endian u16), a ten-byte
//! time field, and a payload. A record with type zero and size zero marks the
//! end of the stream; anything structurally invalid terminates framing at that
//! offset.

use crate::TimeField;
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

/// The fixed part of every record: type, size, and time field.
pub const RECORD_HEADER_LEN: usize = 14;

/// The largest total record size the logger writes.
pub const MAX_RECORD_LEN: usize = 500;

/// The kind of a framed record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// A CAN bus frame.
    Can,
    /// An NMEA sentence from the GPS receiver.
    Nmea,
    /// Written by the logger but carries no decoded semantics.
    Reserved3,
    /// Written by the logger but carries no decoded semantics.
    Reserved4,
    /// An in-band lap boundary marker.
    LapMarker,
}

impl RecordKind {
    /// Converts a raw record type to a kind, if it is one of the known five.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::RecordKind;
    ///
    /// assert_eq!(Some(RecordKind::Can), RecordKind::from_u16(1));
    /// assert_eq!(None, RecordKind::from_u16(6));
    /// ```
    pub fn from_u16(n: u16) -> Option<RecordKind> {
        match n {
            1 => Some(RecordKind::Can),
            2 => Some(RecordKind::Nmea),
            3 => Some(RecordKind::Reserved3),
            4 => Some(RecordKind::Reserved4),
            5 => Some(RecordKind::LapMarker),
            _ => None,
        }
    }
}

/// One framed record, borrowing its payload from the input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record<'a> {
    /// The kind of this record.
    pub kind: RecordKind,
    /// The raw ten-byte time field.
    pub time: TimeField,
    /// The payload bytes after the time field.
    pub payload: &'a [u8],
}

/// Why framing stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stop {
    /// Framing has not stopped yet.
    #[default]
    Running,
    /// A type-zero, size-zero end marker was reached.
    EndMarker,
    /// The input ended between records.
    EndOfInput,
    /// A record violated the size or type constraints.
    MalformedRecord {
        /// Byte offset of the offending record.
        offset: usize,
    },
    /// A record's calendar time field was not a representable datetime.
    BadTimestamp {
        /// Byte offset of the offending record.
        offset: usize,
    },
}

/// An iterator over the records of a data section.
///
/// Stops at the end marker, the end of the input, or the first structurally
/// invalid record; [RecordReader::stop] reports which.
///
/// # Examples
///
/// ```
/// use ctrk::RecordReader;
///
/// let reader = RecordReader::new(&[], 0);
/// assert_eq!(0, reader.count());
/// ```
#[derive(Clone, Debug)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
    stop: Stop,
}

impl<'a> RecordReader<'a> {
    /// Creates a new reader over `data`, framing from byte offset `start`.
    pub fn new(data: &'a [u8], start: usize) -> RecordReader<'a> {
        RecordReader {
            data,
            pos: start,
            stop: Stop::Running,
        }
    }

    /// Returns the reason framing stopped.
    ///
    /// [Stop::Running] until the iterator has returned `None`.
    pub fn stop(&self) -> Stop {
        self.stop
    }

    /// Returns the byte offset of the next record.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        if self.stop != Stop::Running {
            return None;
        }
        if self.pos + RECORD_HEADER_LEN > self.data.len() {
            self.stop = Stop::EndOfInput;
            return None;
        }
        let raw_kind = LittleEndian::read_u16(&self.data[self.pos..]);
        let total_size = usize::from(LittleEndian::read_u16(&self.data[self.pos + 2..]));
        if raw_kind == 0 && total_size == 0 {
            self.stop = Stop::EndMarker;
            return None;
        }
        let Some(kind) = RecordKind::from_u16(raw_kind) else {
            warn!("unknown record type {} at offset {}", raw_kind, self.pos);
            self.stop = Stop::MalformedRecord { offset: self.pos };
            return None;
        };
        if total_size < RECORD_HEADER_LEN
            || total_size > MAX_RECORD_LEN
            || self.pos + total_size > self.data.len()
        {
            warn!("malformed record of size {} at offset {}", total_size, self.pos);
            self.stop = Stop::MalformedRecord { offset: self.pos };
            return None;
        }
        let mut time = [0; 10];
        time.copy_from_slice(&self.data[self.pos + 4..self.pos + RECORD_HEADER_LEN]);
        let record = Record {
            kind,
            time: TimeField(time),
            payload: &self.data[self.pos + RECORD_HEADER_LEN..self.pos + total_size],
        };
        self.pos += total_size;
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&kind.to_le_bytes());
        bytes.extend_from_slice(&((RECORD_HEADER_LEN + payload.len()) as u16).to_le_bytes());
        bytes.extend_from_slice(&[0; 10]);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn frames_records_in_order() {
        let mut data = record_bytes(1, &[1, 2, 3]);
        data.extend(record_bytes(2, b"$GPRMC"));
        let mut reader = RecordReader::new(&data, 0);
        assert_eq!(RecordKind::Can, reader.next().unwrap().kind);
        let record = reader.next().unwrap();
        assert_eq!(RecordKind::Nmea, record.kind);
        assert_eq!(b"$GPRMC", record.payload);
        assert!(reader.next().is_none());
        assert_eq!(Stop::EndOfInput, reader.stop());
    }

    #[test]
    fn end_marker() {
        let mut data = record_bytes(1, &[]);
        data.extend_from_slice(&[0; 4]);
        let mut reader = RecordReader::new(&data, 0);
        assert!(reader.next().is_some());
        assert!(reader.next().is_none());
        assert_eq!(Stop::EndMarker, reader.stop());
    }

    #[test]
    fn unknown_type_is_malformed() {
        let data = record_bytes(6, &[]);
        let mut reader = RecordReader::new(&data, 0);
        assert!(reader.next().is_none());
        assert_eq!(Stop::MalformedRecord { offset: 0 }, reader.stop());
    }

    #[test]
    fn undersized_record_is_malformed() {
        let mut data = record_bytes(1, &[]);
        data[2] = 13;
        let mut reader = RecordReader::new(&data, 0);
        assert!(reader.next().is_none());
        assert_eq!(Stop::MalformedRecord { offset: 0 }, reader.stop());
    }

    #[test]
    fn overrunning_record_is_malformed() {
        let mut data = record_bytes(1, &[]);
        data[2] = 42;
        let mut reader = RecordReader::new(&data, 0);
        assert!(reader.next().is_none());
        assert_eq!(Stop::MalformedRecord { offset: 0 }, reader.stop());
    }

    #[test]
    fn truncated_header_is_end_of_input() {
        let data = [1, 0, 14, 0];
        let mut reader = RecordReader::new(&data, 0);
        assert!(reader.next().is_none());
        assert_eq!(Stop::EndOfInput, reader.stop());
    }
}
