//! Event file decoding (`.nev`).
//!
//! An event file is a 336-byte basic header, `num_extended_headers` 32-byte
//! extended headers (8-byte tag + 24-byte slot), then fixed-size packets
//! until end of file:
//!
//! ```text
//! packet := timestamp:u32 | packet_id:u16 | body[packet_size - 6]
//! ```
//!
//! Extended headers and packets are dispatched through one table each.
//! Entries missing from a table are consumed and dropped with a log
//! diagnostic, since newer firmware adds tags and packet ids over time.

use crate::error::{DecodeError, Result};
use crate::parser;
use crate::reader::{null_terminated, ByteReader};
use crate::types::{
    DigitalInput, DigitalLabelMode, DigitalValues, EventFileHeader, EventPacket, ExtendedHeader,
};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::BufRead;

/// File magic of event files.
pub const EVENT_MAGIC: &[u8; 8] = b"NEURALEV";

/// Size of the basic header.
pub const BASIC_HEADER_SIZE: u64 = 336;

/// Size of one extended header, tag included.
pub const EXTENDED_HEADER_SIZE: u64 = (TAG_LEN + SLOT_LEN) as u64;

const TAG_LEN: usize = 8;
const SLOT_LEN: usize = 24;
const APPLICATION_LEN: usize = 32;
const COMMENT_LEN: usize = 200;
const RESERVED_LEN: u64 = 52;
const DIGITAL_LABEL_LEN: usize = 16;

/// Timestamp and packet id.
const PACKET_HEADER_SIZE: u32 = 6;

// ============================================================================
// Extended header dispatch
// ============================================================================

type ExtendedHeaderDecoder = fn(&[u8; SLOT_LEN]) -> Result<ExtendedHeader>;

static EXTENDED_HEADER_DECODERS: [(&[u8; TAG_LEN], ExtendedHeaderDecoder); 1] =
    [(b"DIGLABEL", decode_digital_label)];

/// Tags the hardware writes whose contents are not modeled. Skipping these
/// is routine; anything else is logged as a warning.
static UNMODELED_TAGS: [&[u8; TAG_LEN]; 9] = [
    b"NEUEVWAV",
    b"NEUEVLBL",
    b"NEUEVFLT",
    b"VIDEOSYN",
    b"TRACKOBJ",
    b"MAPFILE\0",
    b"ARRAYNME",
    b"ECOMMENT",
    b"CCOMMENT",
];

/// `DIGLABEL`: label[16] mode:u8 reserved[7]
fn decode_digital_label(slot: &[u8; SLOT_LEN]) -> Result<ExtendedHeader> {
    let label = null_terminated(&slot[..DIGITAL_LABEL_LEN])?;
    let code = slot[DIGITAL_LABEL_LEN];
    let mode = DigitalLabelMode::from_code(code).ok_or_else(|| DecodeError::UnknownLabelMode {
        label: label.clone(),
        code,
    })?;
    Ok(ExtendedHeader::DigitalLabel { label, mode })
}

fn extended_header_decoder(tag: &[u8; TAG_LEN]) -> Option<ExtendedHeaderDecoder> {
    EXTENDED_HEADER_DECODERS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, decode)| *decode)
}

// ============================================================================
// Packet dispatch
// ============================================================================

type PacketDecoder = fn(u64, &[u8]) -> Result<EventPacket>;

struct PacketKind {
    id: u16,
    /// Smallest packet size that holds this kind's fields
    min_packet_size: u32,
    decode: PacketDecoder,
}

static EVENT_PACKET_DECODERS: [PacketKind; 1] = [PacketKind {
    id: 0,
    min_packet_size: 18,
    decode: decode_digital_input,
}];

/// Digital input body: reason:u8 reserved:u8 parallel:u16 sma:4×i16, then
/// padding up to the packet size.
fn decode_digital_input(timestamp: u64, body: &[u8]) -> Result<EventPacket> {
    let mut reader = ByteReader::new(body);
    let reason = parser::digital_reason(reader.read_u8()?);
    reader.skip(1)?;
    let parallel = reader.read_u16()?;
    let mut sma = [0i16; 4];
    for value in sma.iter_mut() {
        *value = reader.read_i16()?;
    }
    Ok(EventPacket::DigitalInput(DigitalInput {
        timestamp,
        reason,
        values: DigitalValues { parallel, sma },
    }))
}

fn packet_kind(id: u16) -> Option<&'static PacketKind> {
    EVENT_PACKET_DECODERS.iter().find(|kind| kind.id == id)
}

// ============================================================================
// Header
// ============================================================================

/// Reads the basic header and all extended headers.
///
/// On success the reader is positioned at the first packet, which is checked
/// against the header-size field.
pub fn read_header<R: BufRead>(reader: &mut ByteReader<R>) -> Result<EventFileHeader> {
    let magic = reader.read_array::<8>()?;
    if &magic != EVENT_MAGIC {
        return Err(DecodeError::BadMagic {
            found: String::from_utf8_lossy(&magic).into_owned(),
            expected: "NEURALEV",
        });
    }

    let major = reader.read_u8()?;
    let minor = reader.read_u8()?;
    let flags = parser::event_flags(reader.read_u16()?);
    let header_size = reader.read_u32()?;
    let packet_size = reader.read_u32()?;
    if packet_size < PACKET_HEADER_SIZE {
        return Err(DecodeError::InvalidPacketSize {
            size: packet_size,
            minimum: PACKET_HEADER_SIZE,
        });
    }
    let clock_frequency = reader.read_u32()?;
    let sample_frequency = reader.read_u32()?;
    let time_origin = reader.read_timestamp()?;
    let application = reader.read_string(APPLICATION_LEN)?;
    let comment = reader.read_string(COMMENT_LEN)?;
    reader.skip(RESERVED_LEN)?;
    let base_timestamp = reader.read_u32()?;
    let num_extended_headers = reader.read_u32()?;

    let mut extended_headers = Vec::new();
    for _ in 0..num_extended_headers {
        let tag = reader.read_array::<TAG_LEN>()?;
        let slot = reader.read_array::<SLOT_LEN>()?;
        match extended_header_decoder(&tag) {
            Some(decode) => extended_headers.push(decode(&slot)?),
            None if UNMODELED_TAGS.contains(&&tag) => {
                debug!(
                    "Skipping extended header {:?}",
                    String::from_utf8_lossy(&tag)
                );
            }
            None => {
                warn!(
                    "Skipping unrecognized extended header {:?} at byte {}",
                    String::from_utf8_lossy(&tag),
                    reader.position() - EXTENDED_HEADER_SIZE
                );
            }
        }
    }

    if reader.position() != u64::from(header_size) {
        return Err(DecodeError::HeaderSizeMismatch {
            declared: header_size,
            consumed: reader.position(),
        });
    }

    debug!(
        "NEURALEV v{}.{} header: {} extended headers ({} kept), {}-byte packets",
        major,
        minor,
        num_extended_headers,
        extended_headers.len(),
        packet_size
    );

    Ok(EventFileHeader {
        version: (major, minor),
        flags,
        header_size,
        packet_size,
        clock_frequency,
        sample_frequency,
        time_origin,
        application,
        comment,
        base_timestamp,
        extended_headers,
    })
}

// ============================================================================
// Packets
// ============================================================================

/// Counts packets dropped for having no decoder, warning once per id.
#[derive(Debug, Default)]
struct SkippedPackets {
    by_id: BTreeMap<u16, usize>,
}

impl SkippedPackets {
    fn record(&mut self, id: u16, offset: u64) {
        let count = self.by_id.entry(id).or_insert(0);
        if *count == 0 {
            warn!(
                "Skipping packets with unrecognized id {} (first at byte {})",
                id, offset
            );
        }
        *count += 1;
    }

    fn report(&self) {
        for (id, count) in &self.by_id {
            debug!("Skipped {} packets with id {}", count, id);
        }
    }
}

/// Reads one packet, returning `None` for ids without a decoder.
fn read_packet<R: BufRead>(
    reader: &mut ByteReader<R>,
    packet_size: u32,
    body: &mut Vec<u8>,
    skipped: &mut SkippedPackets,
) -> Result<Option<EventPacket>> {
    let offset = reader.position();
    let timestamp = u64::from(reader.read_u32()?);
    let id = reader.read_u16()?;
    reader.read_into(packet_size.saturating_sub(PACKET_HEADER_SIZE) as usize, body)?;

    let Some(kind) = packet_kind(id) else {
        skipped.record(id, offset);
        return Ok(None);
    };
    if packet_size < kind.min_packet_size {
        return Err(DecodeError::InvalidPacketSize {
            size: packet_size,
            minimum: kind.min_packet_size,
        });
    }
    (kind.decode)(timestamp, &body[..]).map(Some)
}

/// Reads packets until end of file.
pub fn read_packets<R: BufRead>(
    reader: &mut ByteReader<R>,
    header: &EventFileHeader,
) -> Result<Vec<EventPacket>> {
    let body_len = header.packet_size.saturating_sub(PACKET_HEADER_SIZE) as usize;
    let mut body = Vec::with_capacity(body_len);
    let mut skipped = SkippedPackets::default();
    let mut packets = Vec::new();

    while !reader.at_eof()? {
        if let Some(packet) = read_packet(reader, header.packet_size, &mut body, &mut skipped)? {
            packets.push(packet);
        }
    }

    skipped.report();
    Ok(packets)
}
