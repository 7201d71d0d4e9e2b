//! Per-sample modulation engine (the timer interrupt body).
//!
//! # Hot path
//!
//! ```text
//! LFO acc += lfo_tw ─▶ LFO table ─▶ −2048 ─▶ × (depth << 12) ─┐
//!                                                              ▼
//! carrier acc += carrier_tw + ((carrier_tw × product) >> 31) ─▶ carrier table
//! ```
//!
//! # Bit budget
//!
//! | value          | range                         | width      |
//! |----------------|-------------------------------|------------|
//! | LFO sample     | −2048 ..= 2047                | 12 signed  |
//! | depth << 12    | 0 ..= 1_044_480               | 20         |
//! | product        | −2_139_095_040 ..= 2_138_050_560 | 32 signed |
//! | tw × product   | < 2^63                        | 64 signed  |
//! | delta (>> 31)  | fits i32 while tw < 2^31      | 32 signed  |
//!
//! The last row is why carrier frequency is clamped upstream: the delta
//! only fits i32 while the carrier tuning word stays below 2^31 (half the
//! sample rate). Every row is checked by a `debug_assert!`; release
//! builds wrap silently, exactly like the fixed-width hardware arithmetic.
//!
//! # Rules
//!
//! - No floating point, no loops, no blocking, no logging.
//! - One read from each wavetable per tick.
//! - Nothing from `control`, `display` or `logging` is reachable from here.

use super::oscillator::Oscillator;
use super::output::{self, DacCodes};
use super::wavetable::{WaveShape, ZERO_CENTER};
use crate::config::SharedParams;
use crate::hal::{OutputDacs, TimerInterrupt};

/// Left shift widening the 8-bit depth to a 20-bit scale factor.
pub const DEPTH_SHIFT: u32 = 12;

/// Right shift rescaling the 64-bit (tuning × product) back to i32.
pub const DELTA_SHIFT: u32 = 31;

/// Control-rate values consumed by one tick.
///
/// Loaded from [`SharedParams`] field by field; each field is
/// independently valid so a torn set is harmless.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub carrier_tuning: u32,
    pub lfo_tuning: u32,
    pub depth: u8,
    pub carrier_shape: WaveShape,
    pub lfo_shape: WaveShape,
}

/// Everything that persists between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineState {
    pub carrier: Oscillator,
    pub lfo: Oscillator,
}

impl EngineState {
    /// Both accumulators at phase zero.
    pub const fn new() -> Self {
        Self {
            carrier: Oscillator::new(0, WaveShape::Sine),
            lfo: Oscillator::new(0, WaveShape::Sine),
        }
    }
}

/// Result of one tick, before output quantisation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Carrier table sample (12-bit biased)
    pub carrier_sample: u16,
    /// LFO table sample (12-bit biased)
    pub lfo_sample: u16,
    /// Signed carrier increment offset applied this tick
    pub delta: i32,
}

/// Remove the table bias: 12-bit unsigned → 12-bit signed.
#[inline(always)]
pub fn center(sample: u16) -> i32 {
    let signed = sample as i32 - ZERO_CENTER as i32;
    debug_assert!((-2048..=2047).contains(&signed), "LFO sample exceeds 12 bits: {}", sample);
    signed
}

/// Scale a signed LFO sample by `depth << 12`.
#[inline(always)]
pub fn scale_by_depth(signed: i32, depth: u8) -> i32 {
    let factor = (depth as i32) << DEPTH_SHIFT;
    debug_assert!(
        (signed as i64 * factor as i64) >= i32::MIN as i64
            && (signed as i64 * factor as i64) <= i32::MAX as i64,
        "depth product exceeds 32 bits"
    );
    signed.wrapping_mul(factor)
}

/// Frequency deviation proportional to the carrier pitch.
///
/// `(carrier_tuning × product) >> 31` in a 64-bit intermediate.
#[inline(always)]
pub fn modulation_delta(product: i32, carrier_tuning: u32) -> i32 {
    let wide = (carrier_tuning as i64 * product as i64) >> DELTA_SHIFT;
    debug_assert!(
        wide >= i32::MIN as i64 && wide <= i32::MAX as i64,
        "modulation delta exceeds 32 bits: {} (tuning {})",
        wide,
        carrier_tuning
    );
    wide as i32
}

/// One sample tick as a pure function.
///
/// `(state, controls) → (state', frame)`. The caller owns where the state
/// lives; the interrupt handler keeps it in [`ModulationEngine`].
#[inline]
pub fn step(mut state: EngineState, controls: &Controls) -> (EngineState, Frame) {
    state.lfo.retune(controls.lfo_tuning, controls.lfo_shape);
    state.carrier.retune(controls.carrier_tuning, controls.carrier_shape);

    // 1. LFO runs unmodulated
    state.lfo.step();

    // 2-3. Signed LFO value scaled by depth
    let lfo_sample = state.lfo.sample();
    let product = scale_by_depth(center(lfo_sample), controls.depth);

    // 4. Normalise by carrier pitch
    let delta = modulation_delta(product, controls.carrier_tuning);

    // 5. Frequency modulation: delta may slow the carrier down
    state
        .carrier
        .advance(controls.carrier_tuning.wrapping_add(delta as u32));

    // 6. Carrier lookup
    let carrier_sample = state.carrier.sample();

    (
        state,
        Frame {
            carrier_sample,
            lfo_sample,
            delta,
        },
    )
}

/// Interrupt-side owner of the engine state.
///
/// Exactly one `on_sample_tick` per timer period, in timer order.
pub struct ModulationEngine {
    state: EngineState,
}

impl ModulationEngine {
    pub const fn new() -> Self {
        Self {
            state: EngineState::new(),
        }
    }

    /// Current persistent state (for diagnostics and tests).
    #[inline]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Run one tick against explicit controls, without touching hardware.
    #[inline]
    pub fn tick(&mut self, controls: &Controls) -> Frame {
        let (next, frame) = step(self.state, controls);
        self.state = next;
        frame
    }

    /// Timer interrupt body.
    ///
    /// Loads the shared parameters, runs one tick, writes both DACs and
    /// acknowledges the timer. Returns the codes written.
    #[inline]
    pub fn on_sample_tick<D, T>(&mut self, params: &SharedParams, dacs: &mut D, timer: &mut T) -> DacCodes
    where
        D: OutputDacs,
        T: TimerInterrupt,
    {
        let controls = params.controls();
        let frame = self.tick(&controls);

        // 7. Output stage
        let codes = output::quantize(&frame);
        dacs.write_primary(codes.primary);
        dacs.write_monitor(codes.monitor);

        // 8. Clear the interrupt condition
        timer.acknowledge();

        codes
    }

    /// Reset both accumulators (startup only).
    pub fn reset(&mut self) {
        self.state = EngineState::new();
    }
}

impl Default for ModulationEngine {
    fn default() -> Self {
        Self::new()
    }
}
