//! CAN frame decoding and the persistent channel state.
//!
//! Only the fixed set of identifiers broadcast by this vehicle family is
//! decoded; everything else is ignored. Multi-byte fields inside a frame are
//! big-endian, unlike the little-endian record framing around them. The
//! decoded values are held in [ChannelState] as a last-known-value cache: a
//! channel keeps its previous raw value until the next frame for it arrives.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;

/// Engine speed and selected gear.
pub const ENGINE: u16 = 0x0209;
/// Throttle positions and rider-aid flags.
pub const THROTTLE: u16 = 0x0215;
/// Water and intake temperatures plus the fuel consumption delta.
pub const TEMPERATURE_FUEL: u16 = 0x023E;
/// Longitudinal and lateral acceleration.
pub const ACCELERATION: u16 = 0x0250;
/// IMU lean angle and pitch rate.
pub const IMU: u16 = 0x0258;
/// Front and rear brake pressures.
pub const BRAKE: u16 = 0x0260;
/// Front and rear wheel speeds.
pub const WHEEL_SPEED: u16 = 0x0264;
/// ABS intervention flags.
pub const ABS: u16 = 0x0268;

/// The gear field value reported while a gear change is in progress.
const GEAR_CHANGE: u8 = 7;

/// The lean encoding's center point, representing zero degrees.
const LEAN_CENTER: u32 = 9000;

/// Deviations at or below this are clamped to upright.
const LEAN_DEADBAND: u32 = 499;

/// A CAN frame extracted from a record payload.
///
/// The payload of a CAN record is a two-byte little-endian identifier, two
/// padding bytes, a data length code, and the data bytes.
///
/// # Examples
///
/// ```
/// use ctrk::CanFrame;
///
/// let frame = CanFrame::from_payload(&[0x09, 0x02, 0, 0, 8, 0x20, 0, 0, 0, 0x03, 0, 0, 0]).unwrap();
/// assert_eq!(ctrk::can::ENGINE, frame.id);
/// assert_eq!(8, frame.data.len());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanFrame<'a> {
    /// The frame identifier.
    pub id: u16,
    /// The data bytes following the length code.
    pub data: &'a [u8],
}

impl<'a> CanFrame<'a> {
    /// Extracts a frame from a CAN record payload.
    ///
    /// Returns `None` if the payload is too short to carry an identifier and
    /// a length code.
    pub fn from_payload(payload: &'a [u8]) -> Option<CanFrame<'a>> {
        if payload.len() < 5 {
            return None;
        }
        Some(CanFrame {
            id: LittleEndian::read_u16(&payload[0..2]),
            data: &payload[5..],
        })
    }
}

/// What applying a frame to the channel state did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The frame updated its channels.
    Updated,
    /// The frame updated its channels, but the gear was mid-change and held.
    GearHeld,
    /// The frame's data was too short for its handler and was skipped.
    ShortData,
    /// The identifier is not one this vehicle family's decoder knows.
    UnknownId,
}

/// Most-recent raw values for every decoded channel.
///
/// All channels start at zero and update only when a frame for them arrives.
/// Fuel is the one accumulating channel: each [TEMPERATURE_FUEL] frame adds
/// its unsigned delta, and the total is zeroed at lap boundaries by the
/// decoder.
///
/// # Examples
///
/// ```
/// use ctrk::{CanFrame, ChannelState};
///
/// let mut channels = ChannelState::default();
/// let frame = CanFrame {
///     id: ctrk::can::ENGINE,
///     data: &[0x20, 0x00, 0, 0, 0x03, 0, 0, 0],
/// };
/// channels.apply(&frame);
/// assert_eq!(0x2000, channels.rpm);
/// assert_eq!(3, channels.gear);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Engine speed.
    pub rpm: u16,
    /// Selected gear, 0–6.
    pub gear: u8,
    /// Throttle valve position.
    pub tps: u16,
    /// Throttle grip position.
    pub aps: u16,
    /// Coolant temperature.
    pub water_temp: u8,
    /// Intake air temperature.
    pub intake_temp: u8,
    /// Accumulated fuel consumption since the lap started.
    pub fuel: u64,
    /// Front wheel speed.
    pub front_speed: u16,
    /// Rear wheel speed.
    pub rear_speed: u16,
    /// Front brake pressure.
    pub front_brake: u16,
    /// Rear brake pressure.
    pub rear_brake: u16,
    /// Longitudinal acceleration.
    pub acc_x: u16,
    /// Lateral acceleration.
    pub acc_y: u16,
    /// Lean angle magnitude, centered on 9000.
    pub lean: u16,
    /// Lean angle with its side preserved, centered on 9000.
    pub lean_signed: u16,
    /// Pitch rate.
    pub pitch: u16,
    /// Front ABS intervention.
    pub f_abs: bool,
    /// Rear ABS intervention.
    pub r_abs: bool,
    /// Traction control intervention.
    pub tcs: bool,
    /// Slide control intervention.
    pub scs: bool,
    /// Lift (wheelie) control intervention.
    pub lif: bool,
    /// Launch control active.
    pub launch: bool,
}

impl ChannelState {
    /// Applies one CAN frame to the state.
    ///
    /// Frames whose data is shorter than their handler requires are skipped
    /// whole; the state is left unchanged.
    pub fn apply(&mut self, frame: &CanFrame<'_>) -> Applied {
        let data = frame.data;
        match frame.id {
            ENGINE => {
                if data.len() < 5 {
                    return Applied::ShortData;
                }
                self.rpm = BigEndian::read_u16(&data[0..2]);
                let gear = data[4] & 0x07;
                if gear == GEAR_CHANGE {
                    debug!("gear change in progress, holding gear {}", self.gear);
                    return Applied::GearHeld;
                }
                self.gear = gear;
            }
            THROTTLE => {
                if data.len() < 8 {
                    return Applied::ShortData;
                }
                self.tps = BigEndian::read_u16(&data[0..2]);
                self.aps = BigEndian::read_u16(&data[2..4]);
                self.launch = data[6] & 0x60 != 0;
                self.tcs = data[7] & 0x20 != 0;
                self.scs = data[7] & 0x10 != 0;
                self.lif = data[7] & 0x08 != 0;
            }
            TEMPERATURE_FUEL => {
                if data.len() < 4 {
                    return Applied::ShortData;
                }
                self.water_temp = data[0];
                self.intake_temp = data[1];
                self.fuel += u64::from(BigEndian::read_u16(&data[2..4]));
            }
            ACCELERATION => {
                if data.len() < 4 {
                    return Applied::ShortData;
                }
                self.acc_x = BigEndian::read_u16(&data[0..2]);
                self.acc_y = BigEndian::read_u16(&data[2..4]);
            }
            IMU => {
                if data.len() < 8 {
                    return Applied::ShortData;
                }
                (self.lean, self.lean_signed) = decode_lean(data);
                self.pitch = BigEndian::read_u16(&data[6..8]);
            }
            BRAKE => {
                if data.len() < 4 {
                    return Applied::ShortData;
                }
                self.front_brake = BigEndian::read_u16(&data[0..2]);
                self.rear_brake = BigEndian::read_u16(&data[2..4]);
            }
            WHEEL_SPEED => {
                if data.len() < 4 {
                    return Applied::ShortData;
                }
                self.front_speed = BigEndian::read_u16(&data[0..2]);
                self.rear_speed = BigEndian::read_u16(&data[2..4]);
            }
            ABS => {
                if data.len() < 5 {
                    return Applied::ShortData;
                }
                self.r_abs = data[4] & 0x01 != 0;
                self.f_abs = data[4] & 0x02 != 0;
            }
            _ => return Applied::UnknownId,
        }
        Applied::Updated
    }
}

/// Decodes the lean angle from an IMU frame's first four data bytes.
///
/// The angle is not a plain big-endian integer: its nibbles are interleaved
/// across the four bytes. The decoded sum is centered on 9000 (zero degrees),
/// clamped to upright inside a ±499 deadband, and truncated toward upright to
/// the nearest hundredth-degree multiple of 100. Returns the magnitude-only
/// value and the side-preserving value, both centered on 9000.
fn decode_lean(data: &[u8]) -> (u16, u16) {
    let (b0, b1, b2, b3) = (
        u32::from(data[0]),
        u32::from(data[1]),
        u32::from(data[2]),
        u32::from(data[3]),
    );
    let val1 = ((b0 << 4) | (b2 & 0x0f)) << 8;
    let val2 = ((b1 & 0x0f) << 4) | (b3 >> 4);
    let sum = (val1 + val2) & 0xffff;
    let deviation = if sum < LEAN_CENTER {
        LEAN_CENTER - sum
    } else {
        (sum - LEAN_CENTER) & 0xffff
    };
    if deviation <= LEAN_DEADBAND {
        return (LEAN_CENTER as u16, LEAN_CENTER as u16);
    }
    let truncated = deviation - deviation % 100;
    let lean = (LEAN_CENTER + truncated) & 0xffff;
    let lean_signed = if sum < LEAN_CENTER {
        LEAN_CENTER - truncated
    } else {
        lean
    };
    (lean as u16, lean_signed as u16)
}
