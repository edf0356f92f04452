//! Bit-packed flag words.
//!
//! Each flag word has one mask table here; the decoders never test bits
//! directly.

use crate::types::{DigitalReason, EventFlags};

// ============================================================================
// Event file flags word (u16)
// Bits: [0] waveforms stored as 16-bit | [15:1] reserved
// ============================================================================

pub const FLAG_WAVEFORM_16BIT: u16 = 1 << 0;

/// Extracts the named event-file flags.
#[inline]
pub fn event_flags(word: u16) -> EventFlags {
    EventFlags {
        waveform_16bit: word & FLAG_WAVEFORM_16BIT != 0,
    }
}

// ============================================================================
// Digital input reason byte (u8)
// Bits: [0] parallel | [1..4] SMA 1-4 | [5] unused | [6] periodic | [7] serial
// ============================================================================

pub const REASON_PARALLEL: u8 = 1 << 0;
pub const REASON_SMA1: u8 = 1 << 1;
pub const REASON_SMA2: u8 = 1 << 2;
pub const REASON_SMA3: u8 = 1 << 3;
pub const REASON_SMA4: u8 = 1 << 4;
pub const REASON_PERIODIC: u8 = 1 << 6;
pub const REASON_SERIAL: u8 = 1 << 7;

/// Extracts the named reasons from a digital input reason byte.
#[inline]
pub fn digital_reason(bits: u8) -> DigitalReason {
    DigitalReason {
        parallel: bits & REASON_PARALLEL != 0,
        sma1: bits & REASON_SMA1 != 0,
        sma2: bits & REASON_SMA2 != 0,
        sma3: bits & REASON_SMA3 != 0,
        sma4: bits & REASON_SMA4 != 0,
        periodic: bits & REASON_PERIODIC != 0,
        serial: bits & REASON_SERIAL != 0,
    }
}

impl DigitalReason {
    /// Packs the reasons back into the on-disk bit layout.
    pub fn bits(&self) -> u8 {
        [
            (self.parallel, REASON_PARALLEL),
            (self.sma1, REASON_SMA1),
            (self.sma2, REASON_SMA2),
            (self.sma3, REASON_SMA3),
            (self.sma4, REASON_SMA4),
            (self.periodic, REASON_PERIODIC),
            (self.serial, REASON_SERIAL),
        ]
        .into_iter()
        .filter(|&(set, _)| set)
        .fold(0, |acc, (_, mask)| acc | mask)
    }
}
