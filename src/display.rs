//! Status screen on the 2 × 16 LCD.
//!
//! ```text
//! ┌────────────────┐
//! │FREQ LFO DPT SIN│   carrier shape on the right
//! │ 999  99 255 TRI│   Hz, LFO Hz × 10, depth, LFO shape
//! └────────────────┘
//! ```
//!
//! Foreground only. Transfers block for a few milliseconds per refresh.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::Settings;
use crate::fault::{FaultCode, FaultState};
use crate::fg_error;
use crate::hal::st7032::{COLS, ROWS};
use crate::hal::{Lcd, LcdError, StatusLed};
use crate::logging::LogRing;

/// Boot banner, first row.
pub const SPLASH_TITLE: &str = "PyunPyun";

/// Boot banner, second row (printed from column 1).
pub const SPLASH_SUBTITLE: &str = "Machine #3";

/// One LCD row of text, truncated at [`COLS`] characters.
#[derive(Clone, Copy)]
pub struct LineBuf {
    buf: [u8; COLS],
    len: usize,
}

impl LineBuf {
    pub const fn new() -> Self {
        Self {
            buf: [b' '; COLS],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for LineBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let available = COLS - self.len;
        let to_copy = bytes.len().min(available);
        self.buf[self.len..self.len + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.len += to_copy;
        Ok(())
    }
}

impl core::fmt::Debug for LineBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Format both status rows.
///
/// Values are truncated toward zero, LFO frequency is shown in tenths.
pub fn render(settings: &Settings) -> [LineBuf; ROWS] {
    let mut top = LineBuf::new();
    let mut bottom = LineBuf::new();

    let _ = write!(top, "FREQ LFO DPT {}", settings.carrier_shape.label());
    let _ = write!(
        bottom,
        "{:4}{:4}{:4} {}",
        settings.carrier_freq_hz as i32,
        (settings.lfo_freq_hz * 10.0) as i32,
        settings.depth,
        settings.lfo_shape.label()
    );

    [top, bottom]
}

/// Clear the screen and show the boot banner.
pub fn splash<I2C, D>(lcd: &mut Lcd<I2C, D>) -> Result<(), LcdError>
where
    I2C: I2c,
    D: DelayNs,
{
    lcd.clear()?;
    lcd.puts(SPLASH_TITLE)?;
    lcd.set_pos(1, 1)?;
    lcd.puts(SPLASH_SUBTITLE)
}

/// Redraw the status screen and update fault state and LED.
///
/// A failed transfer records a display fault (data = failing row) and
/// turns the LED red. A complete refresh clears display faults (input
/// faults stay) and sets the LED from what remains.
pub fn refresh<I2C, D, L, const N: usize>(
    lcd: &mut Lcd<I2C, D>,
    settings: &Settings,
    fault: &FaultState,
    led: &mut L,
    log: &LogRing<N>,
    now_us: u64,
) -> Result<(), LcdError>
where
    I2C: I2c,
    D: DelayNs,
    L: StatusLed,
{
    let lines = render(settings);

    let result = lines
        .iter()
        .zip(0u8..)
        .try_for_each(|(line, row)| lcd.write_line(row, line.as_str()).map_err(|e| (e, row)));

    let result = match result {
        Ok(()) => {
            fault.clear_if(FaultCode::is_display);
            Ok(())
        }
        Err((e, row)) => {
            fault.set(FaultCode::from(e), row as u32);
            let snap = fault.snapshot();
            fg_error!(log, now_us, "lcd row {}: {} (fault #{})", snap.data, e, snap.count);
            Err(e)
        }
    };
    led.set(fault.indicator());

    result
}
