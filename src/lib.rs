//! # PyunPyun DDS
//!
//! FM direct digital synthesis oscillator for a microcontroller with two
//! DACs: a carrier oscillator frequency-modulated by a slow LFO.
//!
//! ## Architecture
//!
//! Two execution contexts share one parameter block:
//! - Sample interrupt (48 kHz): [`ModulationEngine`] runs one fixed-point
//!   tick and writes both DACs. Never blocks, never logs.
//! - Foreground loop: [`ControlLoop`] reads the front panel and publishes
//!   to [`SharedParams`]; [`display`] redraws the LCD; the log ring drains.
//!
//! Nothing in the foreground is reachable from the interrupt body.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod dds;
pub mod display;
pub mod fault;
pub mod hal;
pub mod logging;

pub use config::{SharedParams, Settings, SAMPLE_RATE_HZ};
pub use control::ControlLoop;
pub use dds::{ModulationEngine, WaveShape};
pub use fault::{FaultCode, FaultState};
pub use logging::LogRing;
