//! The decoder's output unit: one row per emission instant.

use crate::{ChannelState, calibrate};

/// One telemetry sample, emitted at a single instant of reconstructed time.
///
/// Samples carry the raw channel integers; use [Sample::calibrated] for the
/// engineering-unit view.
///
/// # Examples
///
/// ```
/// use ctrk::Sample;
///
/// let sample = Sample::default();
/// assert_eq!(0, sample.channels.rpm);
/// assert_eq!(ctrk::gps::NO_FIX, sample.lat);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// The lap this sample belongs to, counting from 1.
    pub lap: u32,
    /// Reconstructed epoch milliseconds (UTC) of the emission instant.
    pub epoch_ms: i64,
    /// Latitude in signed decimal degrees, or the no-fix sentinel.
    pub lat: f64,
    /// Longitude in signed decimal degrees, or the no-fix sentinel.
    pub lng: f64,
    /// GPS ground speed in knots.
    pub speed_knots: f64,
    /// Snapshot of every CAN channel at the emission instant.
    pub channels: ChannelState,
}

impl Default for Sample {
    fn default() -> Sample {
        Sample {
            lap: 1,
            epoch_ms: 0,
            lat: crate::gps::NO_FIX,
            lng: crate::gps::NO_FIX,
            speed_knots: 0.0,
            channels: ChannelState::default(),
        }
    }
}

impl Sample {
    /// Returns this sample converted to engineering units.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::Sample;
    ///
    /// let mut sample = Sample::default();
    /// sample.channels.lean = 12300;
    /// assert_eq!(33.0, sample.calibrated().lean_deg);
    /// ```
    pub fn calibrated(&self) -> CalibratedSample {
        let channels = &self.channels;
        CalibratedSample {
            lap: self.lap,
            epoch_ms: self.epoch_ms,
            latitude: self.lat,
            longitude: self.lng,
            gps_speed_kmh: calibrate::gps_speed_kmh(self.speed_knots),
            rpm: calibrate::rpm(channels.rpm),
            throttle: calibrate::throttle(channels.tps),
            throttle_grip: calibrate::throttle(channels.aps),
            water_temp_c: calibrate::temperature_c(channels.water_temp),
            intake_temp_c: calibrate::temperature_c(channels.intake_temp),
            front_speed_kmh: calibrate::wheel_speed_kmh(channels.front_speed),
            rear_speed_kmh: calibrate::wheel_speed_kmh(channels.rear_speed),
            fuel_cc: calibrate::fuel_cc(channels.fuel),
            lean_deg: calibrate::lean_deg(channels.lean),
            lean_signed_deg: calibrate::lean_deg(channels.lean_signed),
            pitch_deg_s: calibrate::pitch_deg_s(channels.pitch),
            acc_x_g: calibrate::acceleration_g(channels.acc_x),
            acc_y_g: calibrate::acceleration_g(channels.acc_y),
            front_brake_bar: calibrate::brake_bar(channels.front_brake),
            rear_brake_bar: calibrate::brake_bar(channels.rear_brake),
            gear: channels.gear,
            f_abs: channels.f_abs,
            r_abs: channels.r_abs,
            tcs: channels.tcs,
            scs: channels.scs,
            lif: channels.lif,
            launch: channels.launch,
        }
    }
}

/// A sample in engineering units, one field per exported channel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct CalibratedSample {
    pub lap: u32,
    pub epoch_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub gps_speed_kmh: f64,
    pub rpm: u32,
    pub throttle: f64,
    pub throttle_grip: f64,
    pub water_temp_c: f64,
    pub intake_temp_c: f64,
    pub front_speed_kmh: f64,
    pub rear_speed_kmh: f64,
    pub fuel_cc: f64,
    pub lean_deg: f64,
    pub lean_signed_deg: f64,
    pub pitch_deg_s: f64,
    pub acc_x_g: f64,
    pub acc_y_g: f64,
    pub front_brake_bar: f64,
    pub rear_brake_bar: f64,
    pub gear: u8,
    pub f_abs: bool,
    pub r_abs: bool,
    pub tcs: bool,
    pub scs: bool,
    pub lif: bool,
    pub launch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibrated_view() {
        let mut sample = Sample::default();
        sample.channels.rpm = 12500;
        sample.channels.front_speed = 640;
        sample.channels.fuel = 60;
        sample.channels.lean = 13000;
        sample.channels.lean_signed = 5000;
        sample.speed_knots = 10.0;
        let calibrated = sample.calibrated();
        assert_eq!(4882, calibrated.rpm);
        assert_eq!(36.0, calibrated.front_speed_kmh);
        assert_eq!(0.6, calibrated.fuel_cc);
        assert_eq!(40.0, calibrated.lean_deg);
        assert_eq!(-40.0, calibrated.lean_signed_deg);
        assert_eq!(18.52, calibrated.gps_speed_kmh);
    }
}
