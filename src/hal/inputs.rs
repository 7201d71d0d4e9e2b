//! Front-panel inputs: three knobs on the ADC, two shape buttons.
//!
//! Polled from the foreground loop only. Reads may block until the
//! conversion completes; that is fine there and never allowed in the
//! sample interrupt.

/// Raw ADC readings, one per knob, as returned by the converter.
///
/// Values are signed because the converter may report small negative
/// offsets; the control loop clamps them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnobReadings {
    pub carrier_freq: i16,
    pub lfo_freq: i16,
    pub depth: i16,
}

/// Input acquisition error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// I01: Conversion did not complete
    Timeout,
    /// I02: Converter driver reported an error
    Adc,
}

impl InputError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "I01",
            Self::Adc => "I02",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Timeout => "conversion timeout",
            Self::Adc => "ADC error",
        }
    }
}

impl core::fmt::Display for InputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Front-panel input source.
pub trait ControlInputs {
    /// Convert all knob channels, waiting for the result.
    fn read_knobs(&mut self) -> Result<KnobReadings, InputError>;

    /// Carrier shape button level (true = pressed).
    fn carrier_shape_button(&mut self) -> bool;

    /// LFO shape button level (true = pressed).
    fn lfo_shape_button(&mut self) -> bool;
}
