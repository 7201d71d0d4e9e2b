//! Wavetable bank: one precomputed period per waveform shape.
//!
//! 1024-entry tables of 12-bit unsigned samples, zero-centred at 2048.
//! All tables are built by const evaluation, so nothing is generated at
//! runtime and the bank lives in flash.

use core::f64::consts::{FRAC_PI_2, PI};

/// Number of samples per table (power of two).
pub const TABLE_LEN: usize = 1 << TABLE_BITS;

/// log2(TABLE_LEN): number of accumulator bits used as table index.
pub const TABLE_BITS: u32 = 10;

/// Sample value representing zero signal.
pub const ZERO_CENTER: u16 = 2048;

/// Largest sample value a table may hold (12-bit full scale).
pub const SAMPLE_MAX: u16 = 4095;

/// Peak deviation from [`ZERO_CENTER`].
const AMPLITUDE: f64 = 2047.0;

/// One period of a waveform.
pub type Wavetable = [u16; TABLE_LEN];

/// Selectable waveform shape.
///
/// Discriminants are the selector index used by the control loop and
/// stored in the shared parameter block.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaveShape {
    #[default]
    Sine = 0,
    Triangle = 1,
    Square = 2,
    SawDown = 3,
    SawUp = 4,
}

impl WaveShape {
    /// Number of shapes in the bank.
    pub const COUNT: u8 = 5;

    /// All shapes in selector order.
    pub const ALL: [WaveShape; Self::COUNT as usize] = [
        WaveShape::Sine,
        WaveShape::Triangle,
        WaveShape::Square,
        WaveShape::SawDown,
        WaveShape::SawUp,
    ];

    /// Convert from selector index. Unknown values fall back to `Sine`.
    #[inline]
    pub const fn from_u8(v: u8) -> Self {
        match v {
            1 => WaveShape::Triangle,
            2 => WaveShape::Square,
            3 => WaveShape::SawDown,
            4 => WaveShape::SawUp,
            _ => WaveShape::Sine,
        }
    }

    /// Next shape in selector order, wrapping to `Sine` after `SawUp`.
    #[inline]
    pub const fn next(self) -> Self {
        Self::from_u8((self as u8 + 1) % Self::COUNT)
    }

    /// Three-character label shown on the LCD.
    pub const fn label(self) -> &'static str {
        match self {
            WaveShape::Sine => "SIN",
            WaveShape::Triangle => "TRI",
            WaveShape::Square => "SQR",
            WaveShape::SawDown => "SW1",
            WaveShape::SawUp => "SW2",
        }
    }

    /// Table for this shape.
    #[inline]
    pub fn table(self) -> &'static Wavetable {
        table(self)
    }
}

impl From<u8> for WaveShape {
    fn from(v: u8) -> Self {
        Self::from_u8(v)
    }
}

impl From<WaveShape> for u8 {
    fn from(s: WaveShape) -> Self {
        s as u8
    }
}

/// Return the read-only table for `shape`.
#[inline]
pub fn table(shape: WaveShape) -> &'static Wavetable {
    match shape {
        WaveShape::Sine => &SINE_TABLE,
        WaveShape::Triangle => &TRIANGLE_TABLE,
        WaveShape::Square => &SQUARE_TABLE,
        WaveShape::SawDown => &SAW_DOWN_TABLE,
        WaveShape::SawUp => &SAW_UP_TABLE,
    }
}

/// Sine. Index 0 = 0°, 256 = 90°, 512 = 180°, 768 = 270°.
pub static SINE_TABLE: Wavetable = build(WaveShape::Sine);

/// Triangle in phase with the sine: rises from centre, peaks at 256.
pub static TRIANGLE_TABLE: Wavetable = build(WaveShape::Triangle);

/// Square: high for the first half period, low for the second.
pub static SQUARE_TABLE: Wavetable = build(WaveShape::Square);

/// Falling ramp, full scale to minimum.
pub static SAW_DOWN_TABLE: Wavetable = build(WaveShape::SawDown);

/// Rising ramp, minimum to full scale.
pub static SAW_UP_TABLE: Wavetable = build(WaveShape::SawUp);

const fn build(shape: WaveShape) -> Wavetable {
    let mut table = [0u16; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        table[i] = to_code(unit_value(shape, i));
        i += 1;
    }
    table
}

/// Waveform value at table position `i`, in [-1.0, +1.0].
const fn unit_value(shape: WaveShape, i: usize) -> f64 {
    let ramp = i as f64 / TABLE_LEN as f64;
    match shape {
        WaveShape::Sine => const_sin(ramp * 2.0 * PI),
        WaveShape::Triangle => {
            let t = ramp * 4.0;
            if t < 1.0 {
                t
            } else if t < 3.0 {
                2.0 - t
            } else {
                t - 4.0
            }
        }
        WaveShape::Square => {
            if i < TABLE_LEN / 2 {
                1.0
            } else {
                -1.0
            }
        }
        WaveShape::SawUp => -1.0 + 2.0 * (i as f64) / ((TABLE_LEN - 1) as f64),
        WaveShape::SawDown => 1.0 - 2.0 * (i as f64) / ((TABLE_LEN - 1) as f64),
    }
}

/// Map [-1.0, +1.0] to the biased 12-bit code, rounded to nearest.
const fn to_code(v: f64) -> u16 {
    // Always >= 1.0, so truncation after +0.5 rounds.
    (ZERO_CENTER as f64 + v * AMPLITUDE + 0.5) as u16
}

/// Const-compatible sine for x in [0, 2π).
///
/// Folds into [0, π/2] and evaluates the Taylor series to x¹³
/// (error below 1e-7, far under one 12-bit step).
const fn const_sin(x: f64) -> f64 {
    let (x, sign) = if x >= PI { (x - PI, -1.0) } else { (x, 1.0) };
    let x = if x > FRAC_PI_2 { PI - x } else { x };
    let x2 = x * x;

    sign * x
        * (1.0
            - x2 / 6.0
                * (1.0
                    - x2 / 20.0
                        * (1.0 - x2 / 42.0 * (1.0 - x2 / 72.0 * (1.0 - x2 / 110.0 * (1.0 - x2 / 156.0))))))
}
