//! The decoder: drives records through the channel, GPS, and lap state, and
//! emits samples on a 100 ms grid.
//!
//! Emission is gated on GPS acquisition: nothing is emitted until the first
//! checksum-valid `$GPRMC` sentence, whatever its fix status. From then on a
//! sample is emitted whenever at least 100 ms of reconstructed time has passed
//! since the last one, plus one final sample when the records run out. Lap
//! markers re-align the emission clock without emitting.
//!
//! Two driver modes reproduce the two ways the native viewer consumes a
//! recording. [Mode::Continuous] decodes the whole data section in one pass
//! and detects laps geometrically. [Mode::PerLap] partitions the data section
//! at lap markers and decodes each partition with freshly zeroed state, the
//! lap number coming from partition order; channels visibly snap to zero at
//! boundaries, but accumulating channels match the native per-lap exports
//! exactly.

use crate::{
    CanFrame, ChannelState, Clock, GpsState, Header, LapTracker, RecordKind, RecordReader, Result,
    Sample, Stop, can::Applied, gps,
};
use log::warn;
use std::path::Path;

/// How the decoder assigns laps and resets state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// One pass over the whole data section, laps detected geometrically.
    #[default]
    Continuous,
    /// One pass per lap-marker partition, all state zeroed at each entry.
    PerLap,
}

/// Counters for everything the decoder recovered from or skipped, and the
/// reason framing stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Records framed, of any type.
    pub records: u64,
    /// CAN frames extracted from type-1 records.
    pub can_frames: u64,
    /// CAN frames whose identifier is not decoded.
    pub unknown_can_frames: u64,
    /// CAN frames skipped because their data was too short for their handler.
    pub short_can_frames: u64,
    /// Engine frames whose gear was mid-change and held.
    pub gear_holds: u64,
    /// GPRMC sentences that passed their checksum.
    pub gprmc_accepted: u64,
    /// GPRMC sentences rejected by their checksum.
    pub checksum_failures: u64,
    /// Samples emitted.
    pub samples: u64,
    /// Why framing stopped.
    pub stop: Stop,
}

/// A decoded recording: the emitted samples and the decode diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// Every emitted sample, in emission order.
    pub samples: Vec<Sample>,
    /// Counters and the framing stop reason.
    pub diagnostics: Diagnostics,
}

impl Session {
    /// Reads and decodes a CTRK file in continuous mode.
    ///
    /// The file handle is only held while the bytes are read into memory;
    /// decoding runs against the buffer.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ctrk::Session;
    ///
    /// let session = Session::from_path("20250729-170818.CTRK").unwrap();
    /// println!("{} samples", session.samples.len());
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Session> {
        let data = std::fs::read(path)?;
        Ok(Decoder::new(&data)?.decode())
    }
}

/// Which lap number an emitted sample gets.
enum LapPolicy {
    /// Detect finish-line crossings from the emitted positions.
    Geometric(LapTracker),
    /// The lap is supplied by the per-lap driver.
    Fixed(u32),
}

/// Decodes one CTRK recording from a borrowed byte buffer.
///
/// # Examples
///
/// ```
/// use ctrk::Decoder;
///
/// let mut data = vec![0; 0x34];
/// data[0..4].copy_from_slice(b"HEAD");
/// let session = Decoder::new(&data).unwrap().decode();
/// assert!(session.samples.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    header: Header,
    mode: Mode,
}

impl<'a> Decoder<'a> {
    /// Creates a continuous-mode decoder over a file's bytes.
    ///
    /// Returns an error if the header is invalid or truncated.
    pub fn new(data: &'a [u8]) -> Result<Decoder<'a>> {
        Decoder::with_mode(data, Mode::default())
    }

    /// Creates a decoder with an explicit [Mode].
    pub fn with_mode(data: &'a [u8], mode: Mode) -> Result<Decoder<'a>> {
        Ok(Decoder {
            data,
            header: Header::read_from(data)?,
            mode,
        })
    }

    /// Returns the decoded file header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns this decoder's mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Decodes the recording, materializing every sample.
    pub fn decode(&self) -> Session {
        let mut samples = Vec::new();
        let diagnostics = self.decode_with(|sample| samples.push(sample));
        Session {
            samples,
            diagnostics,
        }
    }

    /// Decodes the recording, handing each sample to a callback as it is
    /// emitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctrk::Decoder;
    ///
    /// let mut data = vec![0; 0x34];
    /// data[0..4].copy_from_slice(b"HEAD");
    /// let mut count = 0;
    /// let diagnostics = Decoder::new(&data).unwrap().decode_with(|_| count += 1);
    /// assert_eq!(diagnostics.samples, count);
    /// ```
    pub fn decode_with<F: FnMut(Sample)>(&self, mut on_sample: F) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();
        match self.mode {
            Mode::Continuous => {
                let mut lap_policy =
                    LapPolicy::Geometric(LapTracker::new(self.header.finish_line().copied()));
                decode_span(
                    self.data,
                    self.header.data_start(),
                    self.data.len(),
                    &mut lap_policy,
                    &mut diagnostics,
                    &mut on_sample,
                );
            }
            Mode::PerLap => {
                let (spans, stop) = self.partitions();
                for (index, &(start, end)) in spans.iter().enumerate() {
                    let mut lap_policy = LapPolicy::Fixed(index as u32 + 1);
                    decode_span(
                        self.data,
                        start,
                        end,
                        &mut lap_policy,
                        &mut diagnostics,
                        &mut on_sample,
                    );
                    if matches!(diagnostics.stop, Stop::BadTimestamp { .. }) {
                        return diagnostics;
                    }
                }
                diagnostics.stop = stop;
            }
        }
        diagnostics
    }

    /// Splits the data section at lap-marker records.
    ///
    /// Each span ends just after its lap marker; the final span ends where
    /// framing stopped, so per-lap reruns never re-encounter the stopping
    /// record.
    fn partitions(&self) -> (Vec<(usize, usize)>, Stop) {
        let mut reader = RecordReader::new(self.data, self.header.data_start());
        let mut spans = Vec::new();
        let mut span_start = self.header.data_start();
        while let Some(record) = reader.next() {
            if record.kind == RecordKind::LapMarker {
                spans.push((span_start, reader.position()));
                span_start = reader.position();
            }
        }
        spans.push((span_start, reader.position()));
        (spans, reader.stop())
    }
}

/// Runs the shared record loop over `data[start..end]`.
///
/// This is the single inner routine behind both modes: the span bounds, the
/// lap policy, and the (always fresh) scheduler state are the only things
/// that differ between a continuous pass and a per-lap partition.
fn decode_span<F: FnMut(Sample)>(
    data: &[u8],
    start: usize,
    end: usize,
    lap_policy: &mut LapPolicy,
    diagnostics: &mut Diagnostics,
    on_sample: &mut F,
) {
    let mut reader = RecordReader::new(&data[..end.min(data.len())], start);
    let mut clock = Clock::new();
    let mut channels = ChannelState::default();
    let mut gps_state = GpsState::default();
    let mut has_gprmc = false;
    let mut last_emit_ms: Option<i64> = None;
    let mut current_ms = 0;

    loop {
        let record_offset = reader.position();
        let Some(record) = reader.next() else {
            diagnostics.stop = reader.stop();
            break;
        };
        let Some(epoch_ms) = clock.update(&record.time) else {
            warn!("unrepresentable time field at offset {}", record_offset);
            diagnostics.stop = Stop::BadTimestamp {
                offset: record_offset,
            };
            break;
        };
        current_ms = epoch_ms;
        diagnostics.records += 1;
        if last_emit_ms.is_none() {
            last_emit_ms = Some(epoch_ms);
        }

        match record.kind {
            RecordKind::Can => {
                if let Some(frame) = CanFrame::from_payload(record.payload) {
                    diagnostics.can_frames += 1;
                    match channels.apply(&frame) {
                        Applied::Updated => {}
                        Applied::GearHeld => diagnostics.gear_holds += 1,
                        Applied::ShortData => diagnostics.short_can_frames += 1,
                        Applied::UnknownId => diagnostics.unknown_can_frames += 1,
                    }
                }
            }
            RecordKind::Nmea => {
                if record.payload.len() > 6 {
                    let text = String::from_utf8_lossy(record.payload);
                    let sentence = text.trim_end_matches(&['\r', '\n', '\0'][..]);
                    if sentence.starts_with("$GPRMC") {
                        if gps::checksum_valid(sentence) {
                            diagnostics.gprmc_accepted += 1;
                            if let Some(position) = gps::parse_gprmc(sentence) {
                                gps_state.update(position);
                            }
                            if !has_gprmc {
                                has_gprmc = true;
                                // The initial sample is stamped with the
                                // clock-start time, not this record's epoch.
                                emit_sample(
                                    last_emit_ms.unwrap_or(epoch_ms),
                                    &mut channels,
                                    &gps_state,
                                    lap_policy,
                                    diagnostics,
                                    on_sample,
                                );
                            }
                        } else {
                            diagnostics.checksum_failures += 1;
                        }
                    }
                }
            }
            RecordKind::LapMarker => {
                last_emit_ms = Some(epoch_ms);
            }
            RecordKind::Reserved3 | RecordKind::Reserved4 => {}
        }

        if let Some(last) = last_emit_ms {
            if has_gprmc && epoch_ms - last >= 100 {
                emit_sample(
                    epoch_ms,
                    &mut channels,
                    &gps_state,
                    lap_policy,
                    diagnostics,
                    on_sample,
                );
                last_emit_ms = Some(epoch_ms);
            }
        }
    }

    if has_gprmc {
        emit_sample(
            current_ms,
            &mut channels,
            &gps_state,
            lap_policy,
            diagnostics,
            on_sample,
        );
    }
}

/// Snapshots the current state into a sample, checking the finish line first.
fn emit_sample<F: FnMut(Sample)>(
    epoch_ms: i64,
    channels: &mut ChannelState,
    gps_state: &GpsState,
    lap_policy: &mut LapPolicy,
    diagnostics: &mut Diagnostics,
    on_sample: &mut F,
) {
    let lap = match lap_policy {
        LapPolicy::Geometric(tracker) => {
            if tracker.observe(gps_state.fix.lat(), gps_state.fix.lng()) {
                channels.fuel = 0;
            }
            tracker.lap()
        }
        LapPolicy::Fixed(lap) => *lap,
    };
    diagnostics.samples += 1;
    on_sample(Sample {
        lap,
        epoch_ms,
        lat: gps_state.fix.lat(),
        lng: gps_state.fix.lng(),
        speed_knots: gps_state.speed_knots,
        channels: *channels,
    });
}
