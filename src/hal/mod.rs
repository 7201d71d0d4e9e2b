//! Hardware Abstraction Layer for the PyunPyun DDS.
//!
//! Thin traits around the peripherals. Business logic stays in core
//! modules, HAL is just I/O. The firmware implements these on ESP-IDF;
//! tests implement them with recording mocks.

pub mod dac;
pub mod inputs;
pub mod led;
pub mod st7032;

pub use dac::{OutputDacs, TimerInterrupt};
pub use inputs::{ControlInputs, InputError, KnobReadings};
pub use led::{LedColor, StatusLed};
pub use st7032::{Lcd, LcdError, LCD_ADDR};
