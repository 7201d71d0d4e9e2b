//! Sample-interrupt side peripherals: the two DACs and the timer.
//!
//! Implementations are called from interrupt context. They must write
//! synchronously and return; no waiting, no allocation, no logging.

/// The two output converters.
pub trait OutputDacs {
    /// Carrier output, 8-bit code.
    fn write_primary(&mut self, code: u8);

    /// LFO monitor output, 7-bit code.
    fn write_monitor(&mut self, code: u8);
}

/// The periodic sample timer.
pub trait TimerInterrupt {
    /// Clear the interrupt condition that triggered this tick.
    fn acknowledge(&mut self);
}

impl<T: OutputDacs + ?Sized> OutputDacs for &mut T {
    #[inline]
    fn write_primary(&mut self, code: u8) {
        (**self).write_primary(code)
    }

    #[inline]
    fn write_monitor(&mut self, code: u8) {
        (**self).write_monitor(code)
    }
}

impl<T: TimerInterrupt + ?Sized> TimerInterrupt for &mut T {
    #[inline]
    fn acknowledge(&mut self) {
        (**self).acknowledge()
    }
}
