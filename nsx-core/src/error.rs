//! Error taxonomy for NSx/NFx/NEV decoding.
//!
//! Every variant is fatal: a decode call that returns an error produces no
//! partial container. Unrecognized extended-header tags and event packet ids
//! are not errors and never surface here.

use thiserror::Error;

/// Errors that can occur while decoding a recording file.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes remained than a field required.
    #[error("Unexpected end of file at byte {offset}: needed {needed} more bytes")]
    Truncated { offset: u64, needed: usize },

    /// A fixed-width text field has no terminating zero byte.
    #[error("Text field of {length} bytes is not null-terminated")]
    MalformedString { length: usize },

    #[error("Bad file magic {found:?}, expected one of {expected}")]
    BadMagic {
        found: String,
        expected: &'static str,
    },

    #[error("Bad magic {found:?} on channel header {index}, expected {expected:?}")]
    BadChannelMagic {
        index: usize,
        found: String,
        expected: String,
    },

    /// The cursor after all headers does not match the declared header size.
    #[error("Header size mismatch: file declares {declared} bytes, decoder consumed {consumed}")]
    HeaderSizeMismatch { declared: u32, consumed: u64 },

    #[error("Unexpected packet type {found} at byte {offset}, expected 1")]
    UnexpectedPacketType { offset: u64, found: u8 },

    #[error("Channel {channel_id} has equal digital extrema ({digital}), gain is undefined")]
    DegenerateCalibration { channel_id: u16, digital: i16 },

    #[error("Channel {channel_id} has unknown filter type code {code}")]
    UnknownFilterType { channel_id: u16, code: u16 },

    #[error("Digital label {label:?} has unknown mode code {code}")]
    UnknownLabelMode { label: String, code: u8 },

    #[error("Invalid event packet size {size}, need at least {minimum} bytes")]
    InvalidPacketSize { size: u32, minimum: u32 },

    #[error("Sample matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type used throughout the decoder.
pub type Result<T> = std::result::Result<T, DecodeError>;
