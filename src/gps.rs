//! GPRMC sentence parsing and the GPS position state.
//!
//! The logger interleaves raw NMEA-0183 sentences from its receiver into the
//! record stream. Only `$GPRMC` sentences are decoded, and only after their
//! checksum validates. The sentence's own clock fields are ignored; record
//! time fields are authoritative.

use log::debug;

/// The output-boundary sentinel for "no fix yet".
pub const NO_FIX: f64 = 9999.0;

/// A GPS position, or the lack of one.
///
/// Internally the absence of a fix is explicit; the downstream-compatible
/// [NO_FIX] sentinel only appears when a position is read out of a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Fix {
    /// No active fix has been received yet.
    #[default]
    Unfixed,
    /// The most recent active fix.
    Fixed {
        /// Latitude in signed decimal degrees.
        lat: f64,
        /// Longitude in signed decimal degrees.
        lng: f64,
    },
}

impl Fix {
    /// Returns the latitude, or [NO_FIX] before the first fix.
    pub fn lat(&self) -> f64 {
        match *self {
            Fix::Unfixed => NO_FIX,
            Fix::Fixed { lat, .. } => lat,
        }
    }

    /// Returns the longitude, or [NO_FIX] before the first fix.
    pub fn lng(&self) -> f64 {
        match *self {
            Fix::Unfixed => NO_FIX,
            Fix::Fixed { lng, .. } => lng,
        }
    }
}

/// The position and ground speed carried by an active GPRMC sentence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    /// Latitude in signed decimal degrees.
    pub lat: f64,
    /// Longitude in signed decimal degrees.
    pub lng: f64,
    /// Ground speed in knots.
    pub speed_knots: f64,
}

/// The receiver state as of the most recent accepted sentence.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GpsState {
    /// The current fix.
    pub fix: Fix,
    /// Ground speed in knots from the current fix.
    pub speed_knots: f64,
}

impl GpsState {
    /// Updates the state from an active fix.
    pub fn update(&mut self, position: Position) {
        self.fix = Fix::Fixed {
            lat: position.lat,
            lng: position.lng,
        };
        self.speed_knots = position.speed_knots;
    }
}

/// Validates an NMEA sentence's checksum.
///
/// The checksum is the XOR of every byte strictly between the leading `$` and
/// the `*`, compared against the two hex digits after the `*`.
///
/// # Examples
///
/// ```
/// use ctrk::gps::checksum_valid;
///
/// assert!(checksum_valid("$GPRMC,120000.00,V,,,,,,,290825,,,N*7A"));
/// assert!(!checksum_valid("$GPRMC,120000.00,V,,,,,,,290825,,,N*00"));
/// ```
pub fn checksum_valid(sentence: &str) -> bool {
    let bytes = sentence.as_bytes();
    let Some(star) = bytes.iter().position(|&b| b == b'*') else {
        return false;
    };
    if star < 1 || star + 3 > bytes.len() {
        return false;
    }
    let computed = bytes[1..star].iter().fold(0, |checksum, &b| checksum ^ b);
    let Ok(hex) = std::str::from_utf8(&bytes[star + 1..star + 3]) else {
        return false;
    };
    match u8::from_str_radix(hex, 16) {
        Ok(expected) => computed == expected,
        Err(_) => false,
    }
}

/// Parses an active-status GPRMC sentence into a position.
///
/// Returns `None` for void fixes (status `V`) and for sentences whose
/// coordinate or speed fields do not parse; the caller's position state is
/// left as it was.
pub fn parse_gprmc(sentence: &str) -> Option<Position> {
    let fields: Vec<&str> = sentence.split(',').collect();
    if fields.len() < 8 {
        return None;
    }
    if fields[2] != "A" {
        debug!("ignoring GPRMC with fix status {:?}", fields[2]);
        return None;
    }
    let mut lat = parse_coordinate(fields[3], 2)?;
    if fields[4] == "S" {
        lat = -lat;
    }
    let mut lng = parse_coordinate(fields[5], 3)?;
    if fields[6] == "W" {
        lng = -lng;
    }
    let speed_knots = fields[7].parse().ok()?;
    Some(Position {
        lat,
        lng,
        speed_knots,
    })
}

/// Converts an NMEA `d{degrees}mm.mmmmm` field to decimal degrees.
fn parse_coordinate(field: &str, degree_digits: usize) -> Option<f64> {
    let degrees: f64 = field.get(..degree_digits)?.parse().ok()?;
    let minutes: f64 = field.get(degree_digits..)?.parse().ok()?;
    Some(degrees + minutes / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(body: &str) -> String {
        let checksum = body.bytes().fold(0, |checksum, b| checksum ^ b);
        format!("${}*{:02X}", body, checksum)
    }

    #[test]
    fn checksum() {
        let sentence =
            with_checksum("GPRMC,120000.00,A,4717.11399,N,00833.91590,E,15.5,90.0,290825,,,A");
        assert!(checksum_valid(&sentence));
        let mut broken = sentence.clone();
        broken.replace_range(sentence.len() - 2.., "00");
        assert!(!checksum_valid(&broken));
    }

    #[test]
    fn checksum_rejects_degenerate_sentences() {
        assert!(!checksum_valid("no star here"));
        assert!(!checksum_valid("$GPRMC*4"));
        assert!(!checksum_valid("*41"));
    }

    #[test]
    fn active_fix() {
        let position =
            parse_gprmc("$GPRMC,120000.00,A,4717.11399,N,00833.91590,E,15.5,90.0,290825,,,A*5B")
                .unwrap();
        assert!((position.lat - (47.0 + 17.11399 / 60.0)).abs() < 1e-12);
        assert!((position.lng - (8.0 + 33.91590 / 60.0)).abs() < 1e-12);
        assert_eq!(15.5, position.speed_knots);
    }

    #[test]
    fn southern_and_western_hemispheres() {
        let position =
            parse_gprmc("$GPRMC,120000.00,A,3751.65000,S,14507.36000,W,0.0,0.0,290825,,,A*00")
                .unwrap();
        assert!(position.lat < 0.0);
        assert!(position.lng < 0.0);
        assert!((position.lat + (37.0 + 51.65 / 60.0)).abs() < 1e-12);
        assert!((position.lng + (145.0 + 7.36 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn void_fix_is_ignored() {
        assert_eq!(
            None,
            parse_gprmc("$GPRMC,120000.00,V,,,,,,,290825,,,N*7A")
        );
    }

    #[test]
    fn unparseable_coordinates_are_ignored() {
        assert_eq!(
            None,
            parse_gprmc("$GPRMC,120000.00,A,not-a-number,N,00833.91590,E,15.5,90.0,290825,,,A*00")
        );
    }

    #[test]
    fn short_sentence_is_ignored() {
        assert_eq!(None, parse_gprmc("$GPRMC,120000.00,A"));
    }

    #[test]
    fn fix_sentinel_at_boundary() {
        let fix = Fix::default();
        assert_eq!(NO_FIX, fix.lat());
        assert_eq!(NO_FIX, fix.lng());
        let fix = Fix::Fixed {
            lat: 35.2,
            lng: 139.5,
        };
        assert_eq!(35.2, fix.lat());
    }

    #[test]
    fn state_update() {
        let mut state = GpsState::default();
        state.update(Position {
            lat: 35.2,
            lng: 139.5,
            speed_knots: 42.0,
        });
        assert_eq!(35.2, state.fix.lat());
        assert_eq!(42.0, state.speed_knots);
    }
}
