//! Stateless maps from raw channel integers to engineering units.
//!
//! Each map is a scalar affine transform reverse-engineered from the native
//! viewer; none of them carries state, and each is injective on its natural
//! domain, so raw values round-trip through the units within quantization.

/// Engine speed in revolutions per minute, truncated to an integer.
///
/// # Examples
///
/// ```
/// assert_eq!(4882, ctrk::calibrate::rpm(12500));
/// ```
pub fn rpm(raw: u16) -> u32 {
    (f64::from(raw) / 2.56) as u32
}

/// Wheel speed in kilometers per hour.
pub fn wheel_speed_kmh(raw: u16) -> f64 {
    (f64::from(raw) / 64.0) * 3.6
}

/// Throttle opening in percent.
pub fn throttle(raw: u16) -> f64 {
    (f64::from(raw) / 8.192) * 100.0 / 84.96
}

/// Brake pressure in bar.
pub fn brake_bar(raw: u16) -> f64 {
    f64::from(raw) / 32.0
}

/// Lean angle in degrees; the raw encoding centers zero degrees on 9000.
///
/// # Examples
///
/// ```
/// assert_eq!(0.0, ctrk::calibrate::lean_deg(9000));
/// assert_eq!(33.0, ctrk::calibrate::lean_deg(12300));
/// ```
pub fn lean_deg(raw: u16) -> f64 {
    f64::from(raw) / 100.0 - 90.0
}

/// Pitch rate in degrees per second.
pub fn pitch_deg_s(raw: u16) -> f64 {
    f64::from(raw) / 100.0 - 300.0
}

/// Acceleration in g.
pub fn acceleration_g(raw: u16) -> f64 {
    f64::from(raw) / 1000.0 - 7.0
}

/// Temperature in degrees Celsius.
pub fn temperature_c(raw: u8) -> f64 {
    f64::from(raw) / 1.6 - 30.0
}

/// Accumulated fuel in cubic centimeters.
pub fn fuel_cc(raw: u64) -> f64 {
    raw as f64 / 100.0
}

/// GPS ground speed in kilometers per hour.
pub fn gps_speed_kmh(knots: f64) -> f64 {
    knots * 1.852
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpm_truncates() {
        assert_eq!(0, rpm(0));
        assert_eq!(390, rpm(1000));
        assert_eq!(25599, rpm(u16::MAX));
    }

    #[test]
    fn wheel_speed() {
        assert_eq!(3.6, wheel_speed_kmh(64));
        assert_eq!(0.0, wheel_speed_kmh(0));
    }

    #[test]
    fn lean_centered_on_9000() {
        assert_eq!(-90.0, lean_deg(0));
        assert_eq!(0.0, lean_deg(9000));
        assert_eq!(40.0, lean_deg(13000));
        assert_eq!(-40.0, lean_deg(5000));
    }

    #[test]
    fn pitch_offset() {
        assert_eq!(0.0, pitch_deg_s(30000));
    }

    #[test]
    fn acceleration_offset() {
        assert_eq!(0.0, acceleration_g(7000));
        assert_eq!(-7.0, acceleration_g(0));
    }

    #[test]
    fn temperature() {
        assert_eq!(-30.0, temperature_c(0));
        assert_eq!(70.0, temperature_c(160));
    }

    #[test]
    fn fuel() {
        assert_eq!(0.6, fuel_cc(60));
    }

    #[test]
    fn gps_speed() {
        assert_eq!(1.852, gps_speed_kmh(1.0));
    }

    #[test]
    fn maps_invert_within_quantization() {
        for raw in (0..=u16::MAX).step_by(997) {
            assert_eq!(raw, (wheel_speed_kmh(raw) / 3.6 * 64.0).round() as u16);
            assert_eq!(raw, (throttle(raw) * 84.96 / 100.0 * 8.192).round() as u16);
            assert_eq!(raw, (brake_bar(raw) * 32.0).round() as u16);
            assert_eq!(raw, ((lean_deg(raw) + 90.0) * 100.0).round() as u16);
            assert_eq!(raw, ((pitch_deg_s(raw) + 300.0) * 100.0).round() as u16);
            assert_eq!(raw, ((acceleration_g(raw) + 7.0) * 1000.0).round() as u16);
        }
        for raw in 0..=u8::MAX {
            assert_eq!(raw, ((temperature_c(raw) + 30.0) * 1.6).round() as u8);
        }
    }
}
