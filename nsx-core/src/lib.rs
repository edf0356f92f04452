//! Decoder library for Blackrock NSx/NEV and Ripple NFx recording files.
//!
//! This crate decodes the binary files written by neurophysiology
//! acquisition systems into plain in-memory values. Continuous files
//! (`.nsN`, `.nfN`) hold timestamped packets of uniformly sampled analog
//! data; event files (`.nev`) hold fixed-size event packets, of which
//! digital input packets are decoded.
//!
//! # Example
//!
//! ```no_run
//! use nsx_core::ContinuousDecoder;
//!
//! let recording = ContinuousDecoder::new().decode_file("datafile001.ns5").unwrap();
//!
//! println!("{} channels at {} Hz", recording.header.num_channels, recording.header.sampling_frequency);
//! println!("{} packets, {} samples", recording.packets.len(), recording.total_samples());
//! ```
//!
//! # Diagnostics
//!
//! Unrecognized extended headers and event packet ids are skipped, not
//! rejected. They are reported through the [`log`](https://docs.rs/log)
//! facade; install any logger to see them.

pub mod calibration;
pub mod continuous;
pub mod decoder;
pub mod error;
pub mod event;
pub mod output;
pub mod parser;
pub mod reader;
pub mod types;

use std::path::Path;

// Re-export commonly used types
pub use calibration::Calibration;
pub use decoder::{open, ContinuousDecoder, EventDecoder, FileKind, Recording};
pub use error::{DecodeError, Result};
pub use output::{DigitalCsvWriter, OutputError, SampleCsvWriter};
pub use types::{
    ChannelHeader, ContinuousFormat, DataPacket, DigitalInput, DigitalLabelMode, DigitalReason,
    DigitalValues, EventFile, EventFileHeader, EventFlags, EventPacket, ExtendedHeader,
    FileHeader, FilterType, RecordingFile, Samples, UtcTimestamp,
};

/// Decodes a continuous file, optionally converting samples to physical units.
pub fn read_continuous<P: AsRef<Path>>(path: P, apply_gain: bool) -> Result<RecordingFile> {
    ContinuousDecoder::new()
        .with_gain(apply_gain)
        .decode_file(path)
}

/// Decodes an event file.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<EventFile> {
    EventDecoder::new().decode_file(path)
}
