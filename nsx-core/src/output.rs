//! CSV export of decoded recordings.
//!
//! Continuous data is written one row per time sample with one column per
//! channel; digital input packets are written one row per packet.

use crate::types::{ChannelHeader, DataPacket, DigitalInput, Samples};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Packet has {found} channels, header declares {expected}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Row {row} of packet at {start} has a timestamp beyond u64")]
    TimestampOverflow { start: u64, row: usize },
}

/// Quotes a CSV field if it contains a separator, quote or newline.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\n'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// CSV writer for continuous sample packets.
pub struct SampleCsvWriter<W: Write> {
    writer: BufWriter<W>,
    num_channels: usize,
    period: u64,
}

impl<W: Write> SampleCsvWriter<W> {
    /// Creates a writer; `period` is the number of clock ticks per sample and
    /// is used to timestamp every row.
    pub fn new(writer: W, num_channels: usize, period: u32) -> Self {
        Self {
            writer: BufWriter::new(writer),
            num_channels,
            period: u64::from(period),
        }
    }

    /// Writes the column header: `timestamp` followed by channel labels.
    pub fn write_header(&mut self, channels: &[ChannelHeader]) -> Result<(), OutputError> {
        write!(self.writer, "timestamp")?;
        for channel in channels {
            write!(self.writer, ",{}", escape(&channel.label))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Writes every time sample of a packet.
    pub fn write_packet(&mut self, packet: &DataPacket) -> Result<(), OutputError> {
        if packet.num_channels() != self.num_channels {
            return Err(OutputError::ChannelMismatch {
                expected: self.num_channels,
                found: packet.num_channels(),
            });
        }
        match &packet.samples {
            Samples::Raw(a) => self.write_rows(packet.timestamp, a.rows()),
            Samples::Calibrated(a) => self.write_rows(packet.timestamp, a.rows()),
            Samples::Float(a) => self.write_rows(packet.timestamp, a.rows()),
        }
    }

    fn write_rows<'a, T, I, R>(&mut self, start: u64, rows: I) -> Result<(), OutputError>
    where
        T: std::fmt::Display + 'a,
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = &'a T>,
    {
        for (i, row) in rows.into_iter().enumerate() {
            let timestamp = (i as u64)
                .checked_mul(self.period)
                .and_then(|delta| start.checked_add(delta))
                .ok_or(OutputError::TimestampOverflow { start, row: i })?;
            write!(self.writer, "{}", timestamp)?;
            for value in row {
                write!(self.writer, ",{}", value)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV writer for digital input packets.
pub struct DigitalCsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> DigitalCsvWriter<W> {
    /// Creates a new digital input CSV writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(self.writer, "timestamp,reason,parallel,sma1,sma2,sma3,sma4")?;
        Ok(())
    }

    /// Writes a batch of digital input packets. The reason column holds the
    /// packed reason bits.
    pub fn write_events<'a, I>(&mut self, events: I) -> Result<(), OutputError>
    where
        I: IntoIterator<Item = &'a DigitalInput>,
    {
        for event in events {
            let [s1, s2, s3, s4] = event.values.sma;
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{}",
                event.timestamp,
                event.reason.bits(),
                event.values.parallel,
                s1,
                s2,
                s3,
                s4
            )?;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes continuous packets to a CSV file.
pub fn write_samples_csv<P: AsRef<Path>>(
    path: P,
    channels: &[ChannelHeader],
    packets: &[DataPacket],
    period: u32,
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = SampleCsvWriter::new(file, channels.len(), period);
    writer.write_header(channels)?;
    for packet in packets {
        writer.write_packet(packet)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes digital input packets to a CSV file.
pub fn write_digital_csv<'a, P, I>(path: P, events: I) -> Result<(), OutputError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a DigitalInput>,
{
    let file = File::create(path)?;
    let mut writer = DigitalCsvWriter::new(file);
    writer.write_header()?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}
