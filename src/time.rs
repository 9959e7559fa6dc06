//! The ten-byte record time field and its reconstruction into epoch milliseconds.
//!
//! Every record carries a calendar timestamp captured by the logger's real-time
//! clock, plus a separate millisecond counter. The two are not latched
//! atomically: the millisecond counter can roll over to zero a record or two
//! before the seconds field advances. [Clock] repairs that while reconstructing
//! a monotonic epoch-millisecond value for each record.

use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDate;

/// The raw ten-byte time field of a record.
///
/// Layout: millis (u16 LE), seconds, minutes, hours, weekday, day, month,
/// year (u16 LE). The weekday byte is carried by the logger but unused.
///
/// # Examples
///
/// ```
/// use ctrk::TimeField;
///
/// // 2025-08-29 12:00:00.500 UTC
/// let field = TimeField([0xf4, 0x01, 0, 0, 12, 0, 29, 8, 0xe9, 0x07]);
/// assert_eq!(500, field.millis());
/// assert_eq!(2025, field.year());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeField(pub [u8; 10]);

impl TimeField {
    /// Returns the millisecond counter, nominally 0–999.
    pub fn millis(&self) -> u16 {
        LittleEndian::read_u16(&self.0[0..2])
    }

    /// Returns the seconds field.
    pub fn second(&self) -> u8 {
        self.0[2]
    }

    /// Returns the minutes field.
    pub fn minute(&self) -> u8 {
        self.0[3]
    }

    /// Returns the hours field.
    pub fn hour(&self) -> u8 {
        self.0[4]
    }

    /// Returns the day-of-month field.
    pub fn day(&self) -> u8 {
        self.0[6]
    }

    /// Returns the month field.
    pub fn month(&self) -> u8 {
        self.0[7]
    }

    /// Returns the year.
    pub fn year(&self) -> u16 {
        LittleEndian::read_u16(&self.0[8..10])
    }

    /// Converts the calendar fields to epoch milliseconds (UTC).
    ///
    /// Returns `None` if the fields do not form a representable datetime.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::TimeField;
    ///
    /// let field = TimeField([0, 0, 0, 0, 0, 0, 1, 1, 0xb2, 0x07]); // 1970-01-01 00:00:00
    /// assert_eq!(Some(0), field.epoch_ms());
    /// ```
    pub fn epoch_ms(&self) -> Option<i64> {
        let datetime = NaiveDate::from_ymd_opt(
            i32::from(self.year()),
            u32::from(self.month()),
            u32::from(self.day()),
        )?
        .and_hms_opt(
            u32::from(self.hour()),
            u32::from(self.minute()),
            u32::from(self.second()),
        )?;
        Some(datetime.and_utc().timestamp_millis() + i64::from(self.millis()))
    }

    /// Returns the seconds-and-higher bytes, i.e. everything but the
    /// millisecond counter.
    fn coarse(&self) -> &[u8] {
        &self.0[2..]
    }
}

/// Incremental epoch reconstruction across consecutive records.
///
/// Most records share their calendar second with the previous record, so the
/// epoch is advanced from the millisecond counter alone. A full calendar
/// conversion only happens when the seconds-and-higher bytes change. The
/// incremental branch also repairs the hardware's non-atomic capture: when the
/// millisecond counter has rolled over but the seconds field has not yet
/// advanced, one second is added.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    prev: Option<(TimeField, i64)>,
}

impl Clock {
    /// Creates a new clock with no history.
    pub fn new() -> Clock {
        Clock::default()
    }

    /// Feeds the next record's time field, returning its epoch milliseconds.
    ///
    /// Returns `None` if a full conversion is required and the calendar fields
    /// are not representable.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::{Clock, TimeField};
    ///
    /// let mut clock = Clock::new();
    /// let t0 = TimeField([100, 0, 30, 0, 0, 0, 1, 1, 0xb2, 0x07]);
    /// let t1 = TimeField([200, 0, 30, 0, 0, 0, 1, 1, 0xb2, 0x07]);
    /// let first = clock.update(&t0).unwrap();
    /// assert_eq!(first + 100, clock.update(&t1).unwrap());
    /// ```
    pub fn update(&mut self, time: &TimeField) -> Option<i64> {
        let epoch_ms = match &self.prev {
            None => time.epoch_ms()?,
            Some((prev, prev_epoch_ms)) => {
                if time == prev {
                    return Some(*prev_epoch_ms);
                } else if time.coarse() == prev.coarse() {
                    let base = prev_epoch_ms - i64::from(prev.millis());
                    let mut epoch_ms = base + i64::from(time.millis());
                    if time.millis() < prev.millis() {
                        epoch_ms += 1000;
                    }
                    epoch_ms
                } else {
                    time.epoch_ms()?
                }
            }
        };
        self.prev = Some((*time, epoch_ms));
        Some(epoch_ms)
    }
}
