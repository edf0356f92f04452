//! File-level decoders.
//!
//! Each decoder opens the file, decodes the header block, reads packets until
//! end of file and assembles the result. The file handle lives only for the
//! duration of the call and is closed on every return path.

use crate::continuous::{self, FormatSpec};
use crate::error::{DecodeError, Result};
use crate::event::{self, EVENT_MAGIC};
use crate::reader::ByteReader;
use crate::types::{EventFile, RecordingFile};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

/// Decoder for continuous files (`NEURALCD`, `NEUCDFLT`, `BRSMPGRP`).
#[derive(Debug, Clone)]
pub struct ContinuousDecoder {
    apply_gain: bool,
}

impl Default for ContinuousDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContinuousDecoder {
    /// Creates a decoder that converts samples to physical units.
    pub fn new() -> Self {
        Self { apply_gain: true }
    }

    /// Sets whether 16-bit samples are converted to physical units. When
    /// disabled, packets carry the raw digital values.
    pub fn with_gain(mut self, apply_gain: bool) -> Self {
        self.apply_gain = apply_gain;
        self
    }

    /// Decodes a continuous file from disk.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<RecordingFile> {
        let path = path.as_ref();
        debug!("Decoding continuous file {:?}", path);
        let file = File::open(path)?;
        self.decode_reader(BufReader::new(file))
    }

    /// Decodes a continuous file from a buffered source positioned at its
    /// first byte.
    pub fn decode_reader<R: BufRead>(&self, source: R) -> Result<RecordingFile> {
        let mut reader = ByteReader::new(source);
        let headers = continuous::read_headers(&mut reader)?;
        let packets = continuous::read_packets(&mut reader, &headers, self.apply_gain)?;

        debug!(
            "Decoded {} packets ({} bytes)",
            packets.len(),
            reader.position()
        );

        Ok(RecordingFile {
            header: headers.header,
            channels: headers.channels,
            packets,
        })
    }
}

/// Decoder for event files (`NEURALEV`).
#[derive(Debug, Clone, Default)]
pub struct EventDecoder;

impl EventDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes an event file from disk.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<EventFile> {
        let path = path.as_ref();
        debug!("Decoding event file {:?}", path);
        let file = File::open(path)?;
        self.decode_reader(BufReader::new(file))
    }

    /// Decodes an event file from a buffered source positioned at its first
    /// byte.
    pub fn decode_reader<R: BufRead>(&self, source: R) -> Result<EventFile> {
        let mut reader = ByteReader::new(source);
        let header = event::read_header(&mut reader)?;
        let packets = event::read_packets(&mut reader, &header)?;

        debug!(
            "Decoded {} event packets ({} bytes)",
            packets.len(),
            reader.position()
        );

        Ok(EventFile { header, packets })
    }
}

/// File family, as told by the magic or by the file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Continuous,
    Event,
}

impl FileKind {
    /// Identifies a file from its first eight bytes.
    pub fn sniff(magic: &[u8; 8]) -> Option<Self> {
        if magic == EVENT_MAGIC {
            Some(Self::Event)
        } else if FormatSpec::lookup(magic).is_some() {
            Some(Self::Continuous)
        } else {
            None
        }
    }

    /// Guesses the family from the conventional suffix (`.nsN`, `.nfN`,
    /// `.nev`). Advisory only.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_bytes() {
            b"nev" => Some(Self::Event),
            [b'n', b's' | b'f', b'1'..=b'9'] => Some(Self::Continuous),
            _ => None,
        }
    }
}

/// Either kind of decoded file.
#[derive(Debug, Clone, PartialEq)]
pub enum Recording {
    Continuous(RecordingFile),
    Events(EventFile),
}

/// Decodes a file of either family, choosing the decoder from its magic.
///
/// `apply_gain` only affects continuous files.
pub fn open<P: AsRef<Path>>(path: P, apply_gain: bool) -> Result<Recording> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let magic = ByteReader::new(BufReader::new(&mut file)).read_array::<8>()?;
    file.rewind()?;

    let kind = FileKind::sniff(&magic).ok_or_else(|| DecodeError::BadMagic {
        found: String::from_utf8_lossy(&magic).into_owned(),
        expected: "NEURALCD, NEUCDFLT, BRSMPGRP, NEURALEV",
    })?;

    if let Some(hint) = FileKind::from_extension(path) {
        if hint != kind {
            warn!(
                "{:?} has a {:?} suffix but {:?} contents",
                path, hint, kind
            );
        }
    }

    let source = BufReader::new(file);
    match kind {
        FileKind::Continuous => ContinuousDecoder::new()
            .with_gain(apply_gain)
            .decode_reader(source)
            .map(Recording::Continuous),
        FileKind::Event => EventDecoder::new()
            .decode_reader(source)
            .map(Recording::Events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff() {
        assert_eq!(FileKind::sniff(b"NEURALCD"), Some(FileKind::Continuous));
        assert_eq!(FileKind::sniff(b"NEUCDFLT"), Some(FileKind::Continuous));
        assert_eq!(FileKind::sniff(b"BRSMPGRP"), Some(FileKind::Continuous));
        assert_eq!(FileKind::sniff(b"NEURALEV"), Some(FileKind::Event));
        assert_eq!(FileKind::sniff(b"NEURALSG"), None);
    }

    #[test]
    fn test_from_extension() {
        let kind = |p: &str| FileKind::from_extension(Path::new(p));
        assert_eq!(kind("rec/datafile001.ns5"), Some(FileKind::Continuous));
        assert_eq!(kind("rec/datafile001.NF3"), Some(FileKind::Continuous));
        assert_eq!(kind("rec/datafile001.nev"), Some(FileKind::Event));
        assert_eq!(kind("rec/datafile001.ns0"), None);
        assert_eq!(kind("rec/datafile001.ns10"), None);
        assert_eq!(kind("rec/datafile001"), None);
    }

    #[test]
    fn test_decoder_defaults_to_gain() {
        assert!(ContinuousDecoder::new().apply_gain);
        assert!(!ContinuousDecoder::default().with_gain(false).apply_gain);
    }
}
