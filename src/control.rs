//! Foreground control loop: front panel → shared parameters.
//!
//! Runs at control rate (as fast as the main loop spins, well below the
//! sample rate) and may block on the ADC. Each poll:
//!
//! 1. Converts the three knobs, clamps to 11 bits, scales to Hz / depth
//! 2. Edge-detects both shape buttons, advancing the shape on press only
//! 3. Publishes everything to [`SharedParams`] (tuning words included)
//!
//! The sample interrupt never calls in here.

use crate::config::{
    Settings, SharedParams, ADC_FULL_SCALE, ADC_HIGH_LIMIT, ADC_LOW_LIMIT, CARRIER_FREQ_MAX_HZ,
    DEPTH_DIVISOR, LFO_FREQ_MAX_HZ,
};
use crate::dds::WaveShape;
use crate::fault::{FaultCode, FaultState};
use crate::hal::{ControlInputs, InputError, KnobReadings};
use crate::logging::LogRing;
use crate::{fg_debug, fg_info, fg_warn};

/// Clamp a raw ADC reading to `ADC_LOW_LIMIT..=ADC_HIGH_LIMIT`.
#[inline]
pub fn clamp_adc(raw: i16) -> i16 {
    raw.clamp(ADC_LOW_LIMIT, ADC_HIGH_LIMIT)
}

/// Map a reading to `0.0..max_hz` (full scale = 2048 counts).
#[inline]
pub fn scale_frequency(raw: i16, max_hz: f32) -> f32 {
    max_hz * clamp_adc(raw) as f32 / ADC_FULL_SCALE as f32
}

/// Map a reading to a modulation depth 0..=255.
#[inline]
pub fn scale_depth(raw: i16) -> u8 {
    (clamp_adc(raw) / DEPTH_DIVISOR) as u8
}

/// Knob readings → (carrier Hz, LFO Hz, depth).
pub fn scale_knobs(knobs: &KnobReadings) -> (f32, f32, u8) {
    (
        scale_frequency(knobs.carrier_freq, CARRIER_FREQ_MAX_HZ),
        scale_frequency(knobs.lfo_freq, LFO_FREQ_MAX_HZ),
        scale_depth(knobs.depth),
    )
}

/// Rising-edge detector for a polled button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { prev: false }
    }

    /// True only on an inactive → active transition.
    #[inline]
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.prev;
        self.prev = level;
        edge
    }
}

/// Button-driven cyclic shape selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeSelector {
    shape: WaveShape,
    edge: EdgeDetector,
}

impl ShapeSelector {
    pub const fn new(shape: WaveShape) -> Self {
        Self {
            shape,
            edge: EdgeDetector::new(),
        }
    }

    #[inline]
    pub fn shape(&self) -> WaveShape {
        self.shape
    }

    /// Feed the button level. Returns the new shape on a press.
    pub fn poll(&mut self, pressed: bool) -> Option<WaveShape> {
        if self.edge.rising(pressed) {
            self.shape = self.shape.next();
            Some(self.shape)
        } else {
            None
        }
    }
}

/// What one poll changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlUpdate {
    /// Settings published this poll
    pub settings: Settings,
    /// New carrier shape, if its button was pressed
    pub carrier_shape_changed: Option<WaveShape>,
    /// New LFO shape, if its button was pressed
    pub lfo_shape_changed: Option<WaveShape>,
    /// Knob read failure (previous knob values were kept)
    pub input_error: Option<InputError>,
}

/// Front-panel state machine.
pub struct ControlLoop {
    carrier_select: ShapeSelector,
    lfo_select: ShapeSelector,
    sample_rate_hz: u32,
}

impl ControlLoop {
    /// Start from the shapes in `initial`.
    pub const fn new(initial: &Settings, sample_rate_hz: u32) -> Self {
        Self {
            carrier_select: ShapeSelector::new(initial.carrier_shape),
            lfo_select: ShapeSelector::new(initial.lfo_shape),
            sample_rate_hz,
        }
    }

    /// One control cycle.
    ///
    /// A failed knob conversion keeps the last published knob values, sets
    /// `fault` (data = low 32 bits of `now_us`) and is logged; buttons are
    /// still processed.
    pub fn poll<I, const N: usize>(
        &mut self,
        inputs: &mut I,
        params: &SharedParams,
        fault: &FaultState,
        log: &LogRing<N>,
        now_us: u64,
    ) -> ControlUpdate
    where
        I: ControlInputs,
    {
        let previous = params.settings();

        let (carrier_freq_hz, lfo_freq_hz, depth, input_error) = match inputs.read_knobs() {
            Ok(knobs) => {
                fault.clear_if(FaultCode::is_input);
                let (c, l, d) = scale_knobs(&knobs);
                (c, l, d, None)
            }
            Err(e) => {
                // Low bits of the timestamp tell repeated failures apart
                fault.set(FaultCode::from(e), now_us as u32);
                fg_warn!(log, now_us, "knobs: {} (fault #{})", e, fault.count());
                (previous.carrier_freq_hz, previous.lfo_freq_hz, previous.depth, Some(e))
            }
        };

        let carrier_shape_changed = self.carrier_select.poll(inputs.carrier_shape_button());
        let lfo_shape_changed = self.lfo_select.poll(inputs.lfo_shape_button());

        if let Some(shape) = carrier_shape_changed {
            fg_info!(log, now_us, "carrier shape {}", shape.label());
        }
        if let Some(shape) = lfo_shape_changed {
            fg_info!(log, now_us, "lfo shape {}", shape.label());
        }

        let settings = Settings {
            carrier_freq_hz,
            lfo_freq_hz,
            depth,
            carrier_shape: self.carrier_select.shape(),
            lfo_shape: self.lfo_select.shape(),
        };

        if settings != previous {
            fg_debug!(
                log,
                now_us,
                "freq {:.1} lfo {:.2} depth {}",
                settings.carrier_freq_hz,
                settings.lfo_freq_hz,
                settings.depth
            );
        }

        params.publish(&settings, self.sample_rate_hz);

        ControlUpdate {
            settings,
            carrier_shape_changed,
            lfo_shape_changed,
            input_error,
        }
    }
}
