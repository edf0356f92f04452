//! Byte-level builders for synthetic NSx/NFx/NEV files.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Channel fields written into a 66-byte channel header.
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub id: u16,
    pub label: &'static str,
    pub digital: (i16, i16),
    pub analog: (i16, i16),
    pub highpass_mhz: u32,
    pub highpass_type: u16,
    pub lowpass_mhz: u32,
    pub lowpass_type: u16,
}

impl ChannelSpec {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            label: "elec",
            digital: (-32764, 32764),
            analog: (-8191, 8191),
            highpass_mhz: 300,
            highpass_type: 1,
            lowpass_mhz: 7_500_000,
            lowpass_type: 1,
        }
    }
}

pub fn put_str(buf: &mut Vec<u8>, s: &str, len: usize) {
    let mut field = vec![0u8; len];
    field[..s.len()].copy_from_slice(s.as_bytes());
    buf.extend_from_slice(&field);
}

fn put_time_origin(buf: &mut Vec<u8>) {
    // 2023-05-17 (Wednesday) 09:41:07.250
    for v in [2023u16, 5, 3, 17, 9, 41, 7, 250] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Basic header plus channel headers of a continuous file.
pub fn continuous_header(
    magic: &[u8; 8],
    label: &str,
    period: u32,
    clock: u32,
    channels: &[ChannelSpec],
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(magic);
    buf.extend_from_slice(&[2, 3]);
    let size = 314 + 66 * channels.len() as u32;
    buf.extend_from_slice(&size.to_le_bytes());
    put_str(&mut buf, label, 16);
    if magic == b"BRSMPGRP" {
        put_str(&mut buf, "", 200);
        put_str(&mut buf, "Central 7.6.0", 52);
        buf.extend_from_slice(&123_456u32.to_le_bytes());
    } else {
        put_str(&mut buf, "synthetic", 256);
    }
    buf.extend_from_slice(&period.to_le_bytes());
    buf.extend_from_slice(&clock.to_le_bytes());
    put_time_origin(&mut buf);
    buf.extend_from_slice(&(channels.len() as u32).to_le_bytes());

    for c in channels {
        buf.extend_from_slice(b"CC");
        buf.extend_from_slice(&c.id.to_le_bytes());
        put_str(&mut buf, c.label, 16);
        buf.extend_from_slice(&[1, (c.id % 256) as u8]);
        for v in [c.digital.0, c.digital.1, c.analog.0, c.analog.1] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        put_str(&mut buf, "uV", 16);
        buf.extend_from_slice(&c.highpass_mhz.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&c.highpass_type.to_le_bytes());
        buf.extend_from_slice(&c.lowpass_mhz.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&c.lowpass_type.to_le_bytes());
    }
    assert_eq!(buf.len() as u32, size);
    buf
}

/// Time-major 16-bit packet. `wide` selects a 64-bit timestamp.
pub fn i16_packet(timestamp: u64, wide: bool, rows: &[Vec<i16>]) -> Vec<u8> {
    let mut buf = vec![1u8];
    if wide {
        buf.extend_from_slice(&timestamp.to_le_bytes());
    } else {
        buf.extend_from_slice(&(timestamp as u32).to_le_bytes());
    }
    buf.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    for row in rows {
        for v in row {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

/// Channel-major float packet.
pub fn f32_packet(timestamp: u32, columns: &[Vec<f32>]) -> Vec<u8> {
    let mut buf = vec![1u8];
    buf.extend_from_slice(&timestamp.to_le_bytes());
    let num_samples = columns.first().map_or(0, Vec::len) as u32;
    buf.extend_from_slice(&num_samples.to_le_bytes());
    for column in columns {
        for v in column {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

/// Extended header record: tag, label[16], mode, padding[7].
pub fn extended_header(tag: &[u8; 8], label: &str, mode: u8) -> Vec<u8> {
    let mut buf = tag.to_vec();
    put_str(&mut buf, label, 16);
    buf.push(mode);
    buf.extend_from_slice(&[0u8; 7]);
    buf
}

/// Basic header plus extended headers of an event file.
pub fn event_header(packet_size: u32, extended: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"NEURALEV");
    buf.extend_from_slice(&[3, 0]);
    buf.extend_from_slice(&0u16.to_le_bytes());
    let size = 336 + 32 * extended.len() as u32;
    buf.extend_from_slice(&size.to_le_bytes());
    buf.extend_from_slice(&packet_size.to_le_bytes());
    buf.extend_from_slice(&30_000u32.to_le_bytes());
    buf.extend_from_slice(&30_000u32.to_le_bytes());
    put_time_origin(&mut buf);
    put_str(&mut buf, "Trellis", 32);
    put_str(&mut buf, "event fixture", 200);
    buf.extend_from_slice(&[0u8; 52]);
    buf.extend_from_slice(&99u32.to_le_bytes());
    buf.extend_from_slice(&(extended.len() as u32).to_le_bytes());
    for record in extended {
        buf.extend_from_slice(record);
    }
    assert_eq!(buf.len() as u32, size);
    buf
}

/// Fixed-size event packet with an arbitrary id and filler body.
pub fn raw_event_packet(timestamp: u32, id: u16, packet_size: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
    buf.resize(packet_size as usize, 0x5A);
    buf
}

/// Digital input packet (id 0).
pub fn digital_packet(
    timestamp: u32,
    reason: u8,
    parallel: u16,
    sma: [i16; 4],
    packet_size: u32,
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.push(reason);
    buf.push(0);
    buf.extend_from_slice(&parallel.to_le_bytes());
    for v in sma {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.resize(packet_size as usize, 0);
    buf
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
