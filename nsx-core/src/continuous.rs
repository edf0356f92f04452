//! Continuous-sampled file decoding (`.nsN` / `.nfN`).
//!
//! A continuous file is a 314-byte basic header, `num_channels` 66-byte
//! channel headers, then data packets until end of file:
//!
//! ```text
//! packet := marker:u8 (=1) | timestamp:u32|u64 | num_samples:u32 | samples
//! ```
//!
//! The three recognized magics differ in header layout, sample encoding and
//! timestamp width; all of that is captured by one row of
//! [`CONTINUOUS_FORMATS`].

use crate::calibration::{calibrate, Calibration};
use crate::error::{DecodeError, Result};
use crate::reader::ByteReader;
use crate::types::{ChannelHeader, ContinuousFormat, DataPacket, FileHeader, FilterType, Samples};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};
use ndarray::Array2;
use std::io::BufRead;

/// Size of the basic header in every continuous format.
pub const BASIC_HEADER_SIZE: u64 = 314;

/// Size of one channel header.
pub const CHANNEL_HEADER_SIZE: u64 = 66;

/// The only packet marker continuous files define.
const DATA_PACKET_MARKER: u8 = 1;

const LABEL_LEN: usize = 16;
const UNITS_LEN: usize = 16;
const STANDARD_COMMENT_LEN: usize = 256;
const EXTENDED_COMMENT_LEN: usize = 200;
const APPLICATION_LEN: usize = 52;

/// Fields between the label and the sampling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderLayout {
    /// comment[256]
    Standard,
    /// comment[200] application[52] processor_timestamp:u32
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleLayout {
    /// i16 values, one row of all channels per time sample
    Int16TimeMajor,
    /// f32 values, all samples of channel 0 first
    Float32ChannelMajor,
}

impl SampleLayout {
    fn width(&self) -> usize {
        match self {
            Self::Int16TimeMajor => 2,
            Self::Float32ChannelMajor => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimestampWidth {
    U32,
    U64,
}

/// Everything that varies between continuous formats.
#[derive(Debug)]
pub(crate) struct FormatSpec {
    pub format: ContinuousFormat,
    pub layout: HeaderLayout,
    pub channel_magic: [u8; 2],
    pub samples: SampleLayout,
    pub timestamp: TimestampWidth,
}

/// Recognized continuous formats, keyed by file magic.
pub(crate) static CONTINUOUS_FORMATS: [FormatSpec; 3] = [
    FormatSpec {
        format: ContinuousFormat::NeuralCd,
        layout: HeaderLayout::Standard,
        channel_magic: *b"CC",
        samples: SampleLayout::Int16TimeMajor,
        timestamp: TimestampWidth::U32,
    },
    FormatSpec {
        format: ContinuousFormat::NeuralCdFloat,
        layout: HeaderLayout::Standard,
        channel_magic: *b"CC",
        samples: SampleLayout::Float32ChannelMajor,
        timestamp: TimestampWidth::U32,
    },
    FormatSpec {
        format: ContinuousFormat::SampleGroup,
        layout: HeaderLayout::Extended,
        channel_magic: *b"CC",
        samples: SampleLayout::Int16TimeMajor,
        timestamp: TimestampWidth::U64,
    },
];

const EXPECTED_MAGICS: &str = "NEURALCD, NEUCDFLT, BRSMPGRP";

impl FormatSpec {
    pub(crate) fn lookup(magic: &[u8; 8]) -> Option<&'static FormatSpec> {
        CONTINUOUS_FORMATS
            .iter()
            .find(|spec| spec.format.magic() == magic)
    }
}

/// Decoded header block of a continuous file.
#[derive(Debug)]
pub struct Headers {
    pub header: FileHeader,
    pub channels: Vec<ChannelHeader>,
    pub(crate) spec: &'static FormatSpec,
}

impl Headers {
    /// Per-channel calibrations, in column order.
    pub fn calibrations(&self) -> Vec<Calibration> {
        self.channels
            .iter()
            .map(|c| Calibration {
                gain: c.gain,
                offset: c.offset,
            })
            .collect()
    }
}

/// Reads the basic header and all channel headers.
///
/// The reader must be positioned at the start of the file. On success it is
/// positioned at the first data packet, which is checked against the
/// header-size field.
pub fn read_headers<R: BufRead>(reader: &mut ByteReader<R>) -> Result<Headers> {
    let (spec, header) = read_file_header(reader)?;

    let channels = (0..header.num_channels as usize)
        .map(|index| read_channel_header(reader, spec, index))
        .collect::<Result<Vec<_>>>()?;

    if reader.position() != u64::from(header.header_size) {
        return Err(DecodeError::HeaderSizeMismatch {
            declared: header.header_size,
            consumed: reader.position(),
        });
    }

    debug!(
        "{} v{}.{} header: {} channels at {} Hz, label {:?}",
        String::from_utf8_lossy(spec.format.magic()),
        header.version.0,
        header.version.1,
        header.num_channels,
        header.sampling_frequency,
        header.label
    );

    Ok(Headers {
        header,
        channels,
        spec,
    })
}

fn read_file_header<R: BufRead>(
    reader: &mut ByteReader<R>,
) -> Result<(&'static FormatSpec, FileHeader)> {
    let magic = reader.read_array::<8>()?;
    let spec = FormatSpec::lookup(&magic).ok_or_else(|| DecodeError::BadMagic {
        found: String::from_utf8_lossy(&magic).into_owned(),
        expected: EXPECTED_MAGICS,
    })?;

    let major = reader.read_u8()?;
    let minor = reader.read_u8()?;
    let header_size = reader.read_u32()?;
    let label = reader.read_string(LABEL_LEN)?;

    let (comments, application, processor_timestamp) = match spec.layout {
        HeaderLayout::Standard => (reader.read_string(STANDARD_COMMENT_LEN)?, None, 0),
        HeaderLayout::Extended => {
            let comment = reader.read_string(EXTENDED_COMMENT_LEN)?;
            let application = reader.read_string(APPLICATION_LEN)?;
            let processor_timestamp = reader.read_u32()?;
            let application = (!application.is_empty()).then_some(application);
            (
                merge_comments(comment, application.as_deref()),
                application,
                processor_timestamp,
            )
        }
    };

    let period = reader.read_u32()?;
    let clock_frequency = reader.read_u32()?;
    let time_origin = reader.read_timestamp()?;
    let num_channels = reader.read_u32()?;

    Ok((
        spec,
        FileHeader {
            format: spec.format,
            version: (major, minor),
            header_size,
            label,
            comments,
            application,
            processor_timestamp,
            period,
            clock_frequency,
            sampling_frequency: f64::from(clock_frequency) / f64::from(period),
            time_origin,
            num_channels,
        },
    ))
}

fn merge_comments(comment: String, application: Option<&str>) -> String {
    match application {
        Some(app) if comment.is_empty() => app.to_string(),
        Some(app) => format!("{comment}; {app}"),
        None => comment,
    }
}

fn read_channel_header<R: BufRead>(
    reader: &mut ByteReader<R>,
    spec: &FormatSpec,
    index: usize,
) -> Result<ChannelHeader> {
    let magic = reader.read_array::<2>()?;
    if magic != spec.channel_magic {
        return Err(DecodeError::BadChannelMagic {
            index,
            found: String::from_utf8_lossy(&magic).into_owned(),
            expected: String::from_utf8_lossy(&spec.channel_magic).into_owned(),
        });
    }

    let id = reader.read_u16()?;
    let label = reader.read_string(LABEL_LEN)?;
    let frontend_id = reader.read_u8()?;
    let frontend_pin = reader.read_u8()?;
    let digital_min = reader.read_i16()?;
    let digital_max = reader.read_i16()?;
    let analog_min = reader.read_i16()?;
    let analog_max = reader.read_i16()?;
    let units = reader.read_string(UNITS_LEN)?;
    let highpass_freq = millihertz_to_hz(reader.read_u32()?);
    let highpass_order = reader.read_u32()?;
    let highpass_type = filter_type(id, reader.read_u16()?)?;
    let lowpass_freq = millihertz_to_hz(reader.read_u32()?);
    let lowpass_order = reader.read_u32()?;
    let lowpass_type = filter_type(id, reader.read_u16()?)?;

    let cal = Calibration::from_extrema(id, digital_min, digital_max, analog_min, analog_max)?;

    Ok(ChannelHeader {
        id,
        label,
        frontend_id,
        frontend_pin,
        digital_min,
        digital_max,
        analog_min,
        analog_max,
        units,
        highpass_freq,
        highpass_order,
        highpass_type,
        lowpass_freq,
        lowpass_order,
        lowpass_type,
        gain: cal.gain,
        offset: cal.offset,
    })
}

#[inline]
fn millihertz_to_hz(mhz: u32) -> f64 {
    f64::from(mhz) / 1000.0
}

fn filter_type(channel_id: u16, code: u16) -> Result<FilterType> {
    FilterType::from_code(code).ok_or(DecodeError::UnknownFilterType { channel_id, code })
}

/// Reads one data packet.
///
/// `calibrations` converts 16-bit samples to physical units when given; float
/// samples are returned as stored. `scratch` is reused between packets.
pub fn read_packet<R: BufRead>(
    reader: &mut ByteReader<R>,
    headers: &Headers,
    calibrations: Option<&[Calibration]>,
    scratch: &mut Vec<u8>,
) -> Result<DataPacket> {
    let spec = headers.spec;
    let num_channels = headers.channels.len();

    let offset = reader.position();
    let marker = reader.read_u8()?;
    if marker != DATA_PACKET_MARKER {
        return Err(DecodeError::UnexpectedPacketType {
            offset,
            found: marker,
        });
    }

    let timestamp = match spec.timestamp {
        TimestampWidth::U32 => u64::from(reader.read_u32()?),
        TimestampWidth::U64 => reader.read_u64()?,
    };
    let num_samples = reader.read_u32()? as usize;
    let count = num_samples.saturating_mul(num_channels);

    reader.read_into(count.saturating_mul(spec.samples.width()), scratch)?;

    let samples = match spec.samples {
        SampleLayout::Int16TimeMajor => {
            let mut values = vec![0i16; count];
            LittleEndian::read_i16_into(&scratch[..], &mut values);
            let raw = Array2::from_shape_vec((num_samples, num_channels), values)?;
            match calibrations {
                Some(cals) => Samples::Calibrated(calibrate(&raw, cals)),
                None => Samples::Raw(raw),
            }
        }
        SampleLayout::Float32ChannelMajor => {
            let mut values = vec![0f32; count];
            LittleEndian::read_f32_into(&scratch[..], &mut values);
            let by_channel = Array2::from_shape_vec((num_channels, num_samples), values)?;
            Samples::Float(by_channel.reversed_axes().as_standard_layout().into_owned())
        }
    };

    trace!(
        "packet at byte {}: timestamp {}, {} samples",
        offset,
        timestamp,
        num_samples
    );

    Ok(DataPacket { timestamp, samples })
}

/// Reads packets until end of file.
pub fn read_packets<R: BufRead>(
    reader: &mut ByteReader<R>,
    headers: &Headers,
    apply_gain: bool,
) -> Result<Vec<DataPacket>> {
    let calibrations = apply_gain.then(|| headers.calibrations());
    let mut scratch = Vec::new();
    let mut packets = Vec::new();

    while !reader.at_eof()? {
        packets.push(read_packet(
            reader,
            headers,
            calibrations.as_deref(),
            &mut scratch,
        )?);
    }

    Ok(packets)
}
