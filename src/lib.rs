//! Native library for reading Yamaha Y-Trac CTRK telemetry recordings.
//!
//! A CTRK file is a multiplexed log written by a motorcycle data-logger: CAN
//! bus frames from the vehicle (engine, throttle, IMU, brakes, wheel speeds,
//! temperatures, fuel, ABS and rider-aid flags), raw NMEA `$GPRMC` sentences
//! from a GPS receiver, and in-band lap markers, all framed as timestamped
//! records behind a tagged header. This crate re-multiplexes those events
//! into a fixed-rate stream: one [Sample] per 100 ms of reconstructed time,
//! each a snapshot of every channel, matching the output of the vehicle
//! maker's own viewer bit for bit.
//!
//! # Decoding a recording
//!
//! Use a [Decoder] over the file's bytes, or [Session::from_path] for the
//! file-reading convenience:
//!
//! ```
//! use ctrk::Decoder;
//!
//! # fn data() -> Vec<u8> {
//! #     let mut data = vec![0; 0x34];
//! #     data[0..4].copy_from_slice(b"HEAD");
//! #     data
//! # }
//! let data = data();
//! let session = Decoder::new(&data).unwrap().decode();
//! for sample in &session.samples {
//!     println!("lap {} at {}: {} rpm", sample.lap, sample.epoch_ms, sample.channels.rpm);
//! }
//! ```
//!
//! Samples carry raw channel integers; [Sample::calibrated] converts one to
//! engineering units via the stateless maps in [calibrate]:
//!
//! ```
//! use ctrk::Sample;
//!
//! let mut sample = Sample::default();
//! sample.channels.lean = 12300;
//! assert_eq!(33.0, sample.calibrated().lean_deg);
//! ```
//!
//! # Driver modes
//!
//! The native viewer is invoked once per lap with everything zeroed at entry.
//! [Mode::PerLap] reproduces that exactly: boundary-sensitive channels such
//! as fuel match the native exports byte for byte, at the cost of channels
//! snapping to zero at lap boundaries. The default [Mode::Continuous] decodes
//! in one pass and detects laps geometrically from the finish line embedded
//! in the header.
//!
//! # Failure handling
//!
//! Only structural header problems are errors ([Error::InvalidMagic],
//! [Error::HeaderTooShort]). Everything recoverable (a checksum-failing
//! sentence, a short CAN payload, a malformed record terminating the stream)
//! is counted in [Diagnostics] and decoding carries on or stops cleanly, so
//! every sample emitted before the problem stays valid.

#![deny(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

pub mod calibrate;
pub mod can;
pub mod gps;

mod decoder;
mod error;
mod header;
mod lap;
mod record;
mod sample;
mod time;

pub use crate::{
    can::{CanFrame, ChannelState},
    decoder::{Decoder, Diagnostics, Mode, Session},
    error::Error,
    gps::{Fix, GpsState},
    header::Header,
    lap::{FinishLine, GeoPoint, LapTracker},
    record::{Record, RecordKind, RecordReader, Stop},
    sample::{CalibratedSample, Sample},
    time::{Clock, TimeField},
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
