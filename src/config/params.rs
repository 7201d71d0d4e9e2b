//! Shared parameter block (foreground → interrupt).
//!
//! # Consistency
//!
//! Best effort, no locking. Each field is an independent atomic with
//! `Relaxed` ordering. There is no invariant spanning two fields, so a
//! tick that races a publish sees at worst one stale-but-valid value for
//! one sample period. The interrupt never waits on anything here.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::dds::engine::Controls;
use crate::dds::tuning::tuning_word;
use crate::dds::WaveShape;

/// Foreground-level parameters, before tuning-word conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// Carrier frequency, already clamped to `CARRIER_FREQ_MAX_HZ`
    pub carrier_freq_hz: f32,
    /// LFO frequency, already clamped to `LFO_FREQ_MAX_HZ`
    pub lfo_freq_hz: f32,
    /// Modulation depth 0..=255
    pub depth: u8,
    pub carrier_shape: WaveShape,
    pub lfo_shape: WaveShape,
}

/// Lock-free parameter block.
///
/// Written only by the control loop via [`publish`](Self::publish).
/// Read by the interrupt via [`controls`](Self::controls) and by the
/// display via [`snapshot`](Self::snapshot).
pub struct SharedParams {
    carrier_tuning: AtomicU32,
    lfo_tuning: AtomicU32,
    /// f32 bit patterns, display only
    carrier_freq_bits: AtomicU32,
    lfo_freq_bits: AtomicU32,
    depth: AtomicU8,
    carrier_shape: AtomicU8,
    lfo_shape: AtomicU8,
    /// Bumped on every publish
    generation: AtomicU32,
}

impl SharedParams {
    /// All-zero block (silent carrier, stopped LFO, sine shapes).
    ///
    /// `const` so it can back a `static`; call [`publish`](Self::publish)
    /// with the defaults before starting the sample timer.
    pub const fn new() -> Self {
        Self {
            carrier_tuning: AtomicU32::new(0),
            lfo_tuning: AtomicU32::new(0),
            carrier_freq_bits: AtomicU32::new(0),
            lfo_freq_bits: AtomicU32::new(0),
            depth: AtomicU8::new(0),
            carrier_shape: AtomicU8::new(WaveShape::Sine as u8),
            lfo_shape: AtomicU8::new(WaveShape::Sine as u8),
            generation: AtomicU32::new(0),
        }
    }

    /// Block pre-loaded with `settings`.
    pub fn with_settings(settings: &Settings, sample_rate_hz: u32) -> Self {
        let params = Self::new();
        params.publish(settings, sample_rate_hz);
        params
    }

    /// Convert `settings` to tuning words and store every field.
    ///
    /// Control rate only (uses floating point).
    pub fn publish(&self, settings: &Settings, sample_rate_hz: u32) {
        let carrier_tw = tuning_word(settings.carrier_freq_hz, sample_rate_hz);
        let lfo_tw = tuning_word(settings.lfo_freq_hz, sample_rate_hz);

        self.carrier_tuning.store(carrier_tw, Ordering::Relaxed);
        self.lfo_tuning.store(lfo_tw, Ordering::Relaxed);
        self.carrier_freq_bits
            .store(settings.carrier_freq_hz.to_bits(), Ordering::Relaxed);
        self.lfo_freq_bits
            .store(settings.lfo_freq_hz.to_bits(), Ordering::Relaxed);
        self.depth.store(settings.depth, Ordering::Relaxed);
        self.carrier_shape
            .store(settings.carrier_shape as u8, Ordering::Relaxed);
        self.lfo_shape.store(settings.lfo_shape as u8, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    /// Values the sample interrupt needs for one tick.
    #[inline(always)]
    pub fn controls(&self) -> Controls {
        Controls {
            carrier_tuning: self.carrier_tuning.load(Ordering::Relaxed),
            lfo_tuning: self.lfo_tuning.load(Ordering::Relaxed),
            depth: self.depth.load(Ordering::Relaxed),
            carrier_shape: WaveShape::from_u8(self.carrier_shape.load(Ordering::Relaxed)),
            lfo_shape: WaveShape::from_u8(self.lfo_shape.load(Ordering::Relaxed)),
        }
    }

    /// Last published settings (frequencies as entered, not re-derived).
    pub fn settings(&self) -> Settings {
        Settings {
            carrier_freq_hz: f32::from_bits(self.carrier_freq_bits.load(Ordering::Relaxed)),
            lfo_freq_hz: f32::from_bits(self.lfo_freq_bits.load(Ordering::Relaxed)),
            depth: self.depth.load(Ordering::Relaxed),
            carrier_shape: WaveShape::from_u8(self.carrier_shape.load(Ordering::Relaxed)),
            lfo_shape: WaveShape::from_u8(self.lfo_shape.load(Ordering::Relaxed)),
        }
    }

    /// Number of publishes since boot.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Get a snapshot of everything (display, logging).
    pub fn snapshot(&self) -> ParamSnapshot {
        let controls = self.controls();
        ParamSnapshot {
            settings: self.settings(),
            carrier_tuning: controls.carrier_tuning,
            lfo_tuning: controls.lfo_tuning,
            generation: self.generation(),
        }
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the parameter block at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSnapshot {
    pub settings: Settings,
    pub carrier_tuning: u32,
    pub lfo_tuning: u32,
    pub generation: u32,
}
