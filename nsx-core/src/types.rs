//! Decoded representations of NSx/NFx continuous files and NEV event files.
//!
//! All records are plain values built once by the decoders and never mutated
//! afterwards.

use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array2;
use std::fmt;

// ============================================================================
// Shared
// ============================================================================

/// Recording start time as stored on disk (a Windows `SYSTEMTIME`, UTC).
///
/// The on-disk day-of-week field is redundant and is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTimestamp {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: u16,
}

impl UtcTimestamp {
    /// Converts to a calendar date-time, or `None` if the fields do not form
    /// a valid date (zeroed headers are common in synthetic files).
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_milli_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
            u32::from(self.millisecond),
        )
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03} UTC",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millisecond
        )
    }
}

// ============================================================================
// Continuous files (.nsN / .nfN)
// ============================================================================

/// Which continuous-file magic was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousFormat {
    /// `NEURALCD`: 16-bit samples, 32-bit packet timestamps.
    NeuralCd,
    /// `NEUCDFLT`: 32-bit float samples stored channel-major.
    NeuralCdFloat,
    /// `BRSMPGRP`: 16-bit samples, 64-bit packet timestamps, processor
    /// timestamp and application name in the header.
    SampleGroup,
}

impl ContinuousFormat {
    /// The 8-byte magic identifying this format.
    pub fn magic(&self) -> &'static [u8; 8] {
        match self {
            Self::NeuralCd => b"NEURALCD",
            Self::NeuralCdFloat => b"NEUCDFLT",
            Self::SampleGroup => b"BRSMPGRP",
        }
    }
}

/// Analog filter family applied by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Butterworth,
    Chebyshev,
}

/// Filter type by on-disk code.
pub const FILTER_TYPES: [FilterType; 3] = [
    FilterType::None,
    FilterType::Butterworth,
    FilterType::Chebyshev,
];

impl FilterType {
    #[inline]
    pub fn from_code(code: u16) -> Option<Self> {
        FILTER_TYPES.get(usize::from(code)).copied()
    }
}

/// File-level header of a continuous recording.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub format: ContinuousFormat,
    /// File specification version (major, minor)
    pub version: (u8, u8),
    /// Total size of the file header plus all channel headers, in bytes
    pub header_size: u32,
    pub label: String,
    /// Free-text comment, with the application name appended when present
    pub comments: String,
    /// Name of the application that created the file (`BRSMPGRP` only)
    pub application: Option<String>,
    /// Processor clock value at recording start, 0 when the format lacks it
    pub processor_timestamp: u32,
    /// Number of clock ticks per sample
    pub period: u32,
    /// Clock ticks per second
    pub clock_frequency: u32,
    /// Samples per second, `clock_frequency / period`. Not finite when the
    /// file declares a period of 0; such files are still decoded.
    pub sampling_frequency: f64,
    pub time_origin: UtcTimestamp,
    pub num_channels: u32,
}

impl FileHeader {
    /// Converts a packet timestamp in clock ticks to seconds.
    pub fn seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / f64::from(self.clock_frequency)
    }
}

/// Per-channel metadata of a continuous recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHeader {
    pub id: u16,
    pub label: String,
    pub frontend_id: u8,
    pub frontend_pin: u8,
    pub digital_min: i16,
    pub digital_max: i16,
    pub analog_min: i16,
    pub analog_max: i16,
    /// Physical unit of the analog range, e.g. "uV"
    pub units: String,
    /// Highpass corner in Hz
    pub highpass_freq: f64,
    pub highpass_order: u32,
    pub highpass_type: FilterType,
    /// Lowpass corner in Hz
    pub lowpass_freq: f64,
    pub lowpass_order: u32,
    pub lowpass_type: FilterType,
    pub gain: f64,
    pub offset: f64,
}

/// Sample matrix of one packet: rows are time samples, columns are channels
/// in channel-header order.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Digital values as stored on disk
    Raw(Array2<i16>),
    /// Digital values converted to physical units
    Calibrated(Array2<f64>),
    /// Float samples from `NEUCDFLT` files
    Float(Array2<f32>),
}

impl Samples {
    pub fn nrows(&self) -> usize {
        match self {
            Self::Raw(a) => a.nrows(),
            Self::Calibrated(a) => a.nrows(),
            Self::Float(a) => a.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Self::Raw(a) => a.ncols(),
            Self::Calibrated(a) => a.ncols(),
            Self::Float(a) => a.ncols(),
        }
    }

    pub fn as_raw(&self) -> Option<&Array2<i16>> {
        match self {
            Self::Raw(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_calibrated(&self) -> Option<&Array2<f64>> {
        match self {
            Self::Calibrated(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&Array2<f32>> {
        match self {
            Self::Float(a) => Some(a),
            _ => None,
        }
    }

    /// Widens any representation to `f64`.
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            Self::Raw(a) => a.mapv(f64::from),
            Self::Calibrated(a) => a.clone(),
            Self::Float(a) => a.mapv(f64::from),
        }
    }
}

/// One timestamped block of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPacket {
    /// Clock ticks since recording start
    pub timestamp: u64,
    pub samples: Samples,
}

impl DataPacket {
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.nrows()
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.ncols()
    }
}

/// A fully decoded continuous recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFile {
    pub header: FileHeader,
    pub channels: Vec<ChannelHeader>,
    pub packets: Vec<DataPacket>,
}

impl RecordingFile {
    /// Looks up a channel by its electrode id.
    pub fn channel(&self, id: u16) -> Option<(usize, &ChannelHeader)> {
        self.channels.iter().enumerate().find(|(_, c)| c.id == id)
    }

    /// Total number of time samples across all packets.
    pub fn total_samples(&self) -> usize {
        self.packets.iter().map(DataPacket::num_samples).sum()
    }
}

// ============================================================================
// Event files (.nev)
// ============================================================================

/// Named bits of the event-file flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlags {
    /// Spike waveforms are stored as 16-bit samples
    pub waveform_16bit: bool,
}

/// How a digital input port is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalLabelMode {
    Serial,
    Parallel,
}

/// Digital label mode by on-disk code.
pub const DIGITAL_LABEL_MODES: [DigitalLabelMode; 2] =
    [DigitalLabelMode::Serial, DigitalLabelMode::Parallel];

impl DigitalLabelMode {
    #[inline]
    pub fn from_code(code: u8) -> Option<Self> {
        DIGITAL_LABEL_MODES.get(usize::from(code)).copied()
    }
}

/// Decoded extended header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedHeader {
    /// `DIGLABEL`: name and mode of a digital input port
    DigitalLabel {
        label: String,
        mode: DigitalLabelMode,
    },
}

/// File-level header of an event file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFileHeader {
    pub version: (u8, u8),
    pub flags: EventFlags,
    /// Total size of the basic header plus all extended headers, in bytes
    pub header_size: u32,
    /// Size of every data packet, in bytes
    pub packet_size: u32,
    /// Timestamp clock ticks per second
    pub clock_frequency: u32,
    /// Waveform sampling rate in Hz
    pub sample_frequency: u32,
    pub time_origin: UtcTimestamp,
    pub application: String,
    pub comment: String,
    /// Processor clock value at recording start
    pub base_timestamp: u32,
    /// Recognized extended headers, in file order
    pub extended_headers: Vec<ExtendedHeader>,
}

impl EventFileHeader {
    /// Iterates over the `(label, mode)` pairs of all digital label headers.
    pub fn digital_labels(&self) -> impl Iterator<Item = (&str, DigitalLabelMode)> {
        self.extended_headers.iter().map(|h| match h {
            ExtendedHeader::DigitalLabel { label, mode } => (label.as_str(), *mode),
        })
    }
}

/// Why a digital input packet was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitalReason {
    pub parallel: bool,
    pub sma1: bool,
    pub sma2: bool,
    pub sma3: bool,
    pub sma4: bool,
    pub periodic: bool,
    pub serial: bool,
}

/// Input values captured with a digital input packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitalValues {
    pub parallel: u16,
    pub sma: [i16; 4],
}

/// A digital input packet (packet id 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalInput {
    /// Clock ticks since recording start
    pub timestamp: u64,
    pub reason: DigitalReason,
    pub values: DigitalValues,
}

/// Decoded event packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPacket {
    DigitalInput(DigitalInput),
}

impl EventPacket {
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::DigitalInput(d) => d.timestamp,
        }
    }
}

/// A fully decoded event file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFile {
    pub header: EventFileHeader,
    pub packets: Vec<EventPacket>,
}

impl EventFile {
    /// Iterates over all digital input packets.
    pub fn digital_inputs(&self) -> impl Iterator<Item = &DigitalInput> {
        self.packets.iter().map(|p| match p {
            EventPacket::DigitalInput(d) => d,
        })
    }
}
