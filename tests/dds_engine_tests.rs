//! Modulation engine tests

use pyunpyun_dds::config::{Settings, DEFAULT_SETTINGS};
use pyunpyun_dds::dds::engine::{center, modulation_delta, scale_by_depth, step, Controls, EngineState};
use pyunpyun_dds::dds::output::quantize;
use pyunpyun_dds::dds::wavetable::{WaveShape, SINE_TABLE};
use pyunpyun_dds::dds::{ModulationEngine, Oscillator};
use pyunpyun_dds::hal::{OutputDacs, TimerInterrupt};
use pyunpyun_dds::{SharedParams, SAMPLE_RATE_HZ};

const TW_1KHZ: u32 = 89_478_485;
const TW_1HZ: u32 = 89_478;

fn controls(depth: u8) -> Controls {
    Controls {
        carrier_tuning: TW_1KHZ,
        lfo_tuning: TW_1HZ,
        depth,
        carrier_shape: WaveShape::Sine,
        lfo_shape: WaveShape::Sine,
    }
}

#[derive(Default)]
struct MockDacs {
    primary: Vec<u8>,
    monitor: Vec<u8>,
}

impl OutputDacs for MockDacs {
    fn write_primary(&mut self, code: u8) {
        self.primary.push(code);
    }

    fn write_monitor(&mut self, code: u8) {
        self.monitor.push(code);
    }
}

#[derive(Default)]
struct MockTimer {
    acks: usize,
}

impl TimerInterrupt for MockTimer {
    fn acknowledge(&mut self) {
        self.acks += 1;
    }
}

#[test]
fn test_zero_depth_is_plain_carrier() {
    let mut engine = ModulationEngine::new();
    let mut reference = Oscillator::new(TW_1KHZ, WaveShape::Sine);
    let c = controls(0);

    for _ in 0..1000 {
        let frame = engine.tick(&c);
        reference.step();
        assert_eq!(frame.delta, 0);
        assert_eq!(frame.carrier_sample, reference.sample());
    }
    assert_eq!(engine.state().carrier.phase(), reference.phase());
}

#[test]
fn test_first_tick_from_reset() {
    let mut engine = ModulationEngine::new();
    let frame = engine.tick(&controls(255));

    // LFO at index 0 sits on the centre: no deviation yet
    assert_eq!(frame.lfo_sample, SINE_TABLE[0]);
    assert_eq!(frame.delta, 0);
    assert_eq!(engine.state().carrier.phase().value(), TW_1KHZ);
    assert_eq!(frame.carrier_sample, SINE_TABLE[(TW_1KHZ >> 22) as usize]);
    assert_eq!(engine.state().lfo.phase().value(), TW_1HZ);
}

#[test]
fn test_full_depth_stays_in_budget() {
    for sample in 0u16..=4095 {
        let signed = center(sample);
        let product = scale_by_depth(signed, 255);
        let delta = modulation_delta(product, TW_1KHZ);

        assert!(delta.unsigned_abs() < TW_1KHZ, "sample {} delta {}", sample, delta);
        // The carrier may slow down but never runs backwards
        assert!(TW_1KHZ as i64 + delta as i64 >= 0);
    }
}

#[test]
fn test_delta_sign_follows_lfo() {
    let up = modulation_delta(scale_by_depth(2047, 128), TW_1KHZ);
    let down = modulation_delta(scale_by_depth(-2048, 128), TW_1KHZ);
    assert!(up > 0);
    assert!(down < 0);
}

#[test]
fn test_delta_scales_with_carrier_pitch() {
    let product = scale_by_depth(1000, 200);
    let low = modulation_delta(product, TW_1KHZ / 4);
    let high = modulation_delta(product, TW_1KHZ);
    assert!((high - 4 * low).abs() <= 4);
}

#[test]
fn test_step_is_pure() {
    let state = EngineState::new();
    let c = controls(180);

    let (a, frame_a) = step(state, &c);
    let (b, frame_b) = step(state, &c);
    assert_eq!(a, b);
    assert_eq!(frame_a, frame_b);
    assert_eq!(state, EngineState::new());
}

#[test]
fn test_engine_matches_step_sequence() {
    let mut engine = ModulationEngine::new();
    let mut state = EngineState::new();
    let c = controls(255);

    // Long enough for the LFO to move well away from centre
    for _ in 0..12_000 {
        let frame = engine.tick(&c);
        let (next, expected) = step(state, &c);
        state = next;
        assert_eq!(frame, expected);
    }
    assert_eq!(*engine.state(), state);
}

#[test]
fn test_modulation_changes_carrier_phase() {
    let mut plain = ModulationEngine::new();
    let mut modulated = ModulationEngine::new();

    for _ in 0..12_000 {
        plain.tick(&controls(0));
        modulated.tick(&controls(255));
    }

    // Same LFO, different carrier trajectory
    assert_eq!(plain.state().lfo, modulated.state().lfo);
    assert_ne!(plain.state().carrier.phase(), modulated.state().carrier.phase());
}

#[test]
fn test_on_sample_tick_writes_both_dacs() {
    let params = SharedParams::with_settings(&DEFAULT_SETTINGS, SAMPLE_RATE_HZ);
    let mut engine = ModulationEngine::new();
    let mut shadow = ModulationEngine::new();
    let mut dacs = MockDacs::default();
    let mut timer = MockTimer::default();

    for i in 0..480 {
        let codes = engine.on_sample_tick(&params, &mut dacs, &mut timer);
        let frame = shadow.tick(&params.controls());

        assert_eq!(codes, quantize(&frame));
        assert_eq!(dacs.primary[i], codes.primary);
        assert_eq!(dacs.monitor[i], codes.monitor);
    }
    assert_eq!(timer.acks, 480);
    assert_eq!(dacs.primary.len(), 480);
}

#[test]
fn test_publish_keeps_phase_continuous() {
    let params = SharedParams::with_settings(
        &Settings {
            depth: 0,
            ..DEFAULT_SETTINGS
        },
        SAMPLE_RATE_HZ,
    );
    let mut engine = ModulationEngine::new();
    let mut dacs = MockDacs::default();
    let mut timer = MockTimer::default();

    for _ in 0..10 {
        engine.on_sample_tick(&params, &mut dacs, &mut timer);
    }
    let before = engine.state().carrier.phase().value();

    params.publish(
        &Settings {
            carrier_freq_hz: 500.0,
            depth: 0,
            ..DEFAULT_SETTINGS
        },
        SAMPLE_RATE_HZ,
    );
    engine.on_sample_tick(&params, &mut dacs, &mut timer);

    let new_tw = params.controls().carrier_tuning;
    assert_eq!(engine.state().carrier.phase().value(), before.wrapping_add(new_tw));
}

#[test]
fn test_reset_clears_state() {
    let mut engine = ModulationEngine::new();
    engine.tick(&controls(10));
    engine.reset();
    assert_eq!(*engine.state(), EngineState::new());
}
