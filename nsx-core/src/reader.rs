//! Primitive little-endian reads with cursor tracking.
//!
//! All NSx/NEV fields are stored in the acquisition hardware's native
//! little-endian order. [`ByteReader`] wraps any buffered source, counts the
//! bytes it consumes, and turns short reads into [`DecodeError::Truncated`].

use crate::error::{DecodeError, Result};
use crate::types::UtcTimestamp;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, BufRead, Read};

/// Cursor-tracking reader over a buffered byte source.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: BufRead> ByteReader<R> {
    /// Wraps a buffered source positioned at byte 0.
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns true when no bytes remain.
    pub fn at_eof(&mut self) -> Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.inner.read_u8();
        self.advance(value, 1)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let value = self.inner.read_u16::<LittleEndian>();
        self.advance(value, 2)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.inner.read_u32::<LittleEndian>();
        self.advance(value, 4)
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        let value = self.inner.read_u64::<LittleEndian>();
        self.advance(value, 8)
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        let value = self.inner.read_i16::<LittleEndian>();
        self.advance(value, 2)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        let value = self.inner.read_f32::<LittleEndian>();
        self.advance(value, 4)
    }

    /// Reads a fixed-size block such as a magic number or type tag.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        let value = self.inner.read_exact(&mut buf);
        self.advance(value, N)?;
        Ok(buf)
    }

    /// Reads exactly `len` bytes into a fresh buffer.
    ///
    /// The buffer grows as data arrives, so a corrupted length field in a
    /// short file fails with `Truncated` instead of allocating `len` up front.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_into(len, &mut buf)?;
        Ok(buf)
    }

    /// Reads exactly `len` bytes into `buf`, replacing its contents.
    pub fn read_into(&mut self, len: usize, buf: &mut Vec<u8>) -> Result<()> {
        buf.clear();
        let got = (&mut self.inner).take(len as u64).read_to_end(buf)?;
        self.position += got as u64;
        if got < len {
            return Err(DecodeError::Truncated {
                offset: self.position,
                needed: len - got,
            });
        }
        Ok(())
    }

    /// Reads a fixed-width text field and returns the text before its
    /// terminating zero byte.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let buf = self.read_bytes(len)?;
        null_terminated(&buf)
    }

    /// Reads the eight u16 fields of an on-disk `SYSTEMTIME`.
    pub fn read_timestamp(&mut self) -> Result<UtcTimestamp> {
        let year = self.read_u16()?;
        let month = self.read_u16()?;
        let _day_of_week = self.read_u16()?;
        let day = self.read_u16()?;
        let hour = self.read_u16()?;
        let minute = self.read_u16()?;
        let second = self.read_u16()?;
        let millisecond = self.read_u16()?;
        Ok(UtcTimestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        })
    }

    /// Discards exactly `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let got = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.position += got;
        if got < len {
            return Err(DecodeError::Truncated {
                offset: self.position,
                needed: (len - got) as usize,
            });
        }
        Ok(())
    }

    fn advance<T>(&mut self, value: io::Result<T>, width: usize) -> Result<T> {
        match value {
            Ok(v) => {
                self.position += width as u64;
                Ok(v)
            }
            // read_exact leaves the consumed count unspecified on EOF; report
            // the field start.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(DecodeError::Truncated {
                offset: self.position,
                needed: width,
            }),
            Err(e) => Err(DecodeError::Io(e)),
        }
    }
}

/// Extracts the text before the first zero byte of a fixed-width field.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected; the
/// hardware writes plain ASCII but leaves garbage after the terminator.
pub fn null_terminated(buf: &[u8]) -> Result<String> {
    let end = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(DecodeError::MalformedString { length: buf.len() })?;
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}
