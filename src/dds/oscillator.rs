//! Phase-accumulator oscillator.
//!
//! A 32-bit wrapping accumulator advanced by a tuning word each sample
//! tick. The top [`TABLE_BITS`] bits select the wavetable entry, the
//! discarded low bits keep accumulating and give sub-sample frequency
//! resolution. No floating point, no division, no bounds arithmetic.

use super::wavetable::{WaveShape, TABLE_BITS};

/// Right shift turning an accumulator value into a table index.
pub const INDEX_SHIFT: u32 = 32 - TABLE_BITS;

/// Accumulator distance covered by one table index step.
pub const INDEX_STEP: u32 = 1 << INDEX_SHIFT;

/// Position within one synthesis cycle, 0..2^32 mapped to [0, 2π).
///
/// Arithmetic is modulo 2^32; wrapping is the periodic behaviour.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseAccumulator(u32);

impl PhaseAccumulator {
    /// Accumulator at phase zero.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Accumulator at an arbitrary raw phase.
    pub const fn from_raw(phase: u32) -> Self {
        Self(phase)
    }

    /// Raw 32-bit phase.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// `acc ← acc + increment (mod 2^32)`.
    #[inline]
    pub fn advance(&mut self, increment: u32) {
        self.0 = self.0.wrapping_add(increment);
    }

    /// Table index from the high-order phase bits. Always < `TABLE_LEN`.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 >> INDEX_SHIFT) as usize
    }

    /// Back to phase zero (startup only).
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// One DDS voice: accumulator, tuning word and wavetable selector.
///
/// Carrier and LFO are both `Oscillator`s; which one modulates which is
/// decided by the modulation engine, not here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Oscillator {
    /// Phase accumulator (top 10 bits = table index)
    phase: PhaseAccumulator,
    /// Phase increment per sample (determines frequency)
    tuning: u32,
    /// Active wavetable
    shape: WaveShape,
}

impl Oscillator {
    /// Create an oscillator at phase zero.
    pub const fn new(tuning: u32, shape: WaveShape) -> Self {
        Self {
            phase: PhaseAccumulator::new(),
            tuning,
            shape,
        }
    }

    /// Load the control-rate values published for this tick.
    #[inline]
    pub fn retune(&mut self, tuning: u32, shape: WaveShape) {
        self.tuning = tuning;
        self.shape = shape;
    }

    #[inline]
    pub fn tuning(&self) -> u32 {
        self.tuning
    }

    #[inline]
    pub fn shape(&self) -> WaveShape {
        self.shape
    }

    #[inline]
    pub fn phase(&self) -> PhaseAccumulator {
        self.phase
    }

    /// Advance by an arbitrary increment (used for the modulated carrier).
    #[inline]
    pub fn advance(&mut self, increment: u32) {
        self.phase.advance(increment);
    }

    /// Advance by the oscillator's own tuning word.
    #[inline]
    pub fn step(&mut self) {
        self.phase.advance(self.tuning);
    }

    /// Current table sample for the active shape.
    #[inline]
    pub fn sample(&self) -> u16 {
        self.shape.table()[self.phase.index()]
    }

    /// Reset phase (e.g. on startup).
    pub fn reset(&mut self) {
        self.phase.reset();
    }
}
