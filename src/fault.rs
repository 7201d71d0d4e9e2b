//! Collaborator fault record.
//!
//! The synthesis core has no error path. What can fail is the foreground
//! I/O around it (LCD transfers, knob acquisition). Those failures are
//! recorded here, shown on the status LED and logged; they never stop or
//! delay the sample interrupt, which keeps playing the last good settings.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::hal::{InputError, LcdError, LedColor};

/// Fault codes indicating which collaborator failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// LCD did not acknowledge a transfer.
    DisplayNoAck = 1,

    /// Other I2C error while talking to the LCD.
    DisplayBus = 2,

    /// Knob conversion did not complete.
    InputTimeout = 3,

    /// ADC driver error.
    InputAdc = 4,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::DisplayNoAck,
            2 => FaultCode::DisplayBus,
            3 => FaultCode::InputTimeout,
            4 => FaultCode::InputAdc,
            _ => FaultCode::None,
        }
    }

    /// True for faults raised by the display path.
    pub fn is_display(self) -> bool {
        matches!(self, FaultCode::DisplayNoAck | FaultCode::DisplayBus)
    }

    /// True for faults raised by knob acquisition.
    pub fn is_input(self) -> bool {
        matches!(self, FaultCode::InputTimeout | FaultCode::InputAdc)
    }
}

impl From<LcdError> for FaultCode {
    fn from(e: LcdError) -> Self {
        match e {
            LcdError::NoAck => FaultCode::DisplayNoAck,
            LcdError::Bus => FaultCode::DisplayBus,
        }
    }
}

impl From<InputError> for FaultCode {
    fn from(e: InputError) -> Self {
        match e {
            InputError::Timeout => FaultCode::InputTimeout,
            InputError::Adc => FaultCode::InputAdc,
        }
    }
}

/// Thread-safe fault state.
///
/// Set by the foreground loop when a collaborator fails, cleared on the
/// next success. Nothing in the sample interrupt reads it.
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (e.g. failing byte, timestamp low bits).
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record a fault. Increments the fault counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Check if fault is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Get fault data (meaning depends on fault code).
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the active flag after a successful operation.
    ///
    /// The counter is kept for diagnostics.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Clear only if the active fault satisfies `pred`.
    ///
    /// Lets one collaborator recover without hiding another's fault.
    #[inline]
    pub fn clear_if(&self, pred: impl Fn(FaultCode) -> bool) {
        if pred(self.code()) {
            self.clear();
        }
    }

    /// Status LED colour for the current state.
    #[inline]
    pub fn indicator(&self) -> LedColor {
        if self.is_active() {
            LedColor::Red
        } else {
            LedColor::Green
        }
    }

    /// Get a snapshot of the current fault state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
