//! Frequency mapper tests

use pyunpyun_dds::dds::oscillator::{PhaseAccumulator, INDEX_STEP};
use pyunpyun_dds::dds::TABLE_LEN;
use pyunpyun_dds::dds::tuning::{frequency_hz, period_ticks, tuning_word};

const SAMPLE_RATE: u32 = 48_000;

#[test]
fn test_one_khz_tuning_word() {
    assert_eq!(tuning_word(1000.0, SAMPLE_RATE), 89_478_485);
}

#[test]
fn test_one_hz_lfo_tuning_word() {
    assert_eq!(tuning_word(1.0, SAMPLE_RATE), 89_478);
}

#[test]
fn test_sample_rate_wraps_to_zero() {
    // 2^32 is one full turn per tick, the same increment as 0
    assert_eq!(tuning_word(48_000.0, SAMPLE_RATE), 0);
}

#[test]
fn test_one_period_returns_to_start() {
    for freq in [1000.0f32, 480.0, 250.0, 100.0, 10.0, 1.0, 7.0] {
        let tw = tuning_word(freq, SAMPLE_RATE);
        let ticks = period_ticks(freq, SAMPLE_RATE);

        let mut acc = PhaseAccumulator::new();
        for _ in 0..ticks {
            acc.advance(tw);
        }

        let end = acc.value();
        let distance = end.min(end.wrapping_neg());
        assert!(
            distance < INDEX_STEP,
            "{} Hz: {} ticks end {} away from phase zero",
            freq,
            ticks,
            distance
        );
        assert!(acc.index() == 0 || acc.index() == TABLE_LEN - 1);
    }
}

#[test]
fn test_frequency_round_trip() {
    for freq in [1000.0f32, 440.0, 10.0, 0.5] {
        let back = frequency_hz(tuning_word(freq, SAMPLE_RATE), SAMPLE_RATE);
        assert!((back - freq).abs() < 0.001, "{} -> {}", freq, back);
    }
}

