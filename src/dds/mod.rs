//! Direct digital synthesis core.
//!
//! Architecture:
//! - Wavetable bank: five const-built 1024 × 12-bit tables
//! - Oscillators: 32-bit phase accumulators, top 10 bits = table index
//! - Tuning: Hz → tuning word, control rate only
//! - Engine: FM step run once per sample from the timer interrupt
//! - Output: 8-bit carrier DAC + 7-bit LFO monitor DAC

pub mod engine;
pub mod oscillator;
pub mod output;
pub mod tuning;
pub mod wavetable;

pub use engine::{step, Controls, EngineState, Frame, ModulationEngine};
pub use oscillator::{Oscillator, PhaseAccumulator};
pub use output::DacCodes;
pub use tuning::tuning_word;
pub use wavetable::{WaveShape, Wavetable, TABLE_LEN, ZERO_CENTER};
