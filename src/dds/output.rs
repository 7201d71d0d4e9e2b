//! Output stage: rescale one tick's frame to the two DAC widths.
//!
//! - Primary DAC (8 bit): carrier sample >> 4
//! - Monitor DAC (7 bit): raw LFO sample >> 5
//!
//! No clamping. The wavetables hold 12-bit codes, so both shifts land in
//! range by construction; the debug assertions below are the first place a
//! broken table or a changed shift would show up.

use super::engine::Frame;

/// Shift from 12-bit table codes to the 8-bit primary DAC.
pub const PRIMARY_SHIFT: u32 = 4;

/// Shift from 12-bit table codes to the 7-bit monitor DAC.
pub const MONITOR_SHIFT: u32 = 5;

/// Largest code the primary DAC accepts.
pub const PRIMARY_MAX: u8 = 0xFF;

/// Largest code the monitor DAC accepts.
pub const MONITOR_MAX: u8 = 0x7F;

/// Codes written to the two converters for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DacCodes {
    /// Carrier output, 0..=255
    pub primary: u8,
    /// LFO monitor output, 0..=127
    pub monitor: u8,
}

/// Carrier sample → primary DAC code.
#[inline(always)]
pub fn primary_code(carrier_sample: u16) -> u8 {
    let code = carrier_sample >> PRIMARY_SHIFT;
    debug_assert!(code <= PRIMARY_MAX as u16, "primary code exceeds 8 bits: {}", code);
    code as u8
}

/// LFO sample → monitor DAC code.
#[inline(always)]
pub fn monitor_code(lfo_sample: u16) -> u8 {
    let code = lfo_sample >> MONITOR_SHIFT;
    debug_assert!(code <= MONITOR_MAX as u16, "monitor code exceeds 7 bits: {}", code);
    code as u8
}

/// Quantise a full frame.
#[inline(always)]
pub fn quantize(frame: &Frame) -> DacCodes {
    DacCodes {
        primary: primary_code(frame.carrier_sample),
        monitor: monitor_code(frame.lfo_sample),
    }
}
