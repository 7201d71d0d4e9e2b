//! Bicolour status LED.

/// Status LED colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    /// Last display transfer completed
    Green,
    /// Last display transfer failed
    Red,
}

/// Status LED output.
pub trait StatusLed {
    fn set(&mut self, color: LedColor);
}
