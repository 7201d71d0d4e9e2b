//! Module: config
//!
//! Purpose: Compile-time constants and the runtime parameter block shared
//! between the foreground control loop and the sample interrupt.
//!
//! Architecture:
//! - Constants: sample rate, control limits, power-on defaults
//! - [`SharedParams`]: one atomic per field, written by the control loop,
//!   read by the interrupt
//! - No persistence: every parameter comes from the front panel at runtime
//!
//! Safety: RT-safe. All access via atomics, no locks.

pub mod params;

pub use params::{ParamSnapshot, Settings, SharedParams};

use crate::dds::WaveShape;

/// Sample interrupt rate.
pub const SAMPLE_RATE_HZ: u32 = 48_000;

/// Upper bound of the carrier frequency knob.
pub const CARRIER_FREQ_MAX_HZ: f32 = 1000.0;

/// Upper bound of the LFO frequency knob.
pub const LFO_FREQ_MAX_HZ: f32 = 10.0;

/// ADC reading treated as full scale when mapping knobs to values.
pub const ADC_FULL_SCALE: i16 = 2048;

/// ADC readings are clamped to `ADC_LOW_LIMIT..=ADC_HIGH_LIMIT` (11 bit).
pub const ADC_LOW_LIMIT: i16 = 0x000;
pub const ADC_HIGH_LIMIT: i16 = 0x7FF;

/// Divider turning a clamped ADC reading into an 8-bit depth.
pub const DEPTH_DIVISOR: i16 = 8;

/// LCD contrast (0..=63). Raise for darker characters.
/// About 0b10_0000 at 3.0 V, 0b11_1000 at 2.7 V.
pub const LCD_CONTRAST: u8 = 0b10_0000;

/// Power-on settings.
pub const DEFAULT_CARRIER_FREQ_HZ: f32 = 1000.0;
pub const DEFAULT_LFO_FREQ_HZ: f32 = 1.0;
pub const DEFAULT_DEPTH: u8 = 255;
pub const DEFAULT_CARRIER_SHAPE: WaveShape = WaveShape::Sine;
pub const DEFAULT_LFO_SHAPE: WaveShape = WaveShape::Sine;

/// Settings applied at boot before the first control cycle.
pub const DEFAULT_SETTINGS: Settings = Settings {
    carrier_freq_hz: DEFAULT_CARRIER_FREQ_HZ,
    lfo_freq_hz: DEFAULT_LFO_FREQ_HZ,
    depth: DEFAULT_DEPTH,
    carrier_shape: DEFAULT_CARRIER_SHAPE,
    lfo_shape: DEFAULT_LFO_SHAPE,
};
