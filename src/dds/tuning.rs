//! Frequency → tuning word conversion (control rate only).
//!
//! `tuning_word = round(freq * 2^32 / sample_rate)`
//!
//! Floating point is fine here: this runs in the foreground loop, never
//! in the sample interrupt. Inputs are expected to be clamped by the
//! caller; the mapper itself never fails.

/// 2^32 as f64 (one full accumulator cycle).
const PHASE_CYCLE: f64 = 4_294_967_296.0;

/// Convert a frequency in Hz to a 32-bit tuning word.
///
/// Negative and NaN inputs saturate to 0. A result of exactly 2^32
/// (freq == sample_rate) wraps to 0, the same increment modulo 2^32.
#[inline]
pub fn tuning_word(freq_hz: f32, sample_rate_hz: u32) -> u32 {
    let exact = freq_hz as f64 * PHASE_CYCLE / sample_rate_hz as f64;
    // Non-negative, so +0.5 then truncation rounds to nearest.
    (exact + 0.5) as u64 as u32
}

/// Inverse mapping, for display and diagnostics.
#[inline]
pub fn frequency_hz(tuning: u32, sample_rate_hz: u32) -> f32 {
    (tuning as f64 * sample_rate_hz as f64 / PHASE_CYCLE) as f32
}

/// Number of ticks in one period of `freq_hz`, rounded.
///
/// Returns 0 for non-positive frequencies.
pub fn period_ticks(freq_hz: f32, sample_rate_hz: u32) -> u32 {
    if !(freq_hz > 0.0) {
        return 0;
    }
    (sample_rate_hz as f64 / freq_hz as f64 + 0.5) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frequency() {
        assert_eq!(tuning_word(0.0, 48_000), 0);
    }

    #[test]
    fn test_negative_saturates() {
        assert_eq!(tuning_word(-5.0, 48_000), 0);
        assert_eq!(tuning_word(f32::NAN, 48_000), 0);
    }

    #[test]
    fn test_nyquist() {
        assert_eq!(tuning_word(24_000.0, 48_000), 1 << 31);
    }

    #[test]
    fn test_inverse_close() {
        let f = frequency_hz(tuning_word(440.0, 48_000), 48_000);
        assert!((f - 440.0).abs() < 0.001);
    }

    #[test]
    fn test_period_ticks() {
        assert_eq!(period_ticks(1000.0, 48_000), 48);
        assert_eq!(period_ticks(0.0, 48_000), 0);
    }
}
