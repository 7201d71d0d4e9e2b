//! ST7032 character LCD driver (2 × 16, I2C)
//!
//! Every transfer is two bytes: a control byte selecting command or data
//! (HD44780 RS=0 / RS=1) followed by the payload.
//! Reference: ST7032 datasheet, AQM1602 module notes

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

/// ST7032 I2C address (fixed)
pub const LCD_ADDR: u8 = 0b011_1110;

/// Visible columns per row
pub const COLS: usize = 16;

/// Visible rows
pub const ROWS: usize = 2;

/// DDRAM address offset between rows
const ROW_STRIDE: u8 = 0x40;

/// Control bytes
const CONTROL_COMMAND: u8 = 0b0000_0000;
const CONTROL_DATA: u8 = 0b0100_0000;

/// ST7032 instructions
mod cmd {
    pub const CLEAR: u8 = 0b0000_0001;
    pub const DISPLAY_ON: u8 = 0b0000_1100;
    pub const INTERNAL_OSC: u8 = 0b0001_0100;
    /// 8-bit bus, 2 lines, normal instruction table
    pub const FUNCTION_SET: u8 = 0b0011_1000;
    /// 8-bit bus, 2 lines, extended instruction table
    pub const FUNCTION_SET_EXT: u8 = 0b0011_1001;
    /// Icon/booster on, contrast bits 5:4 in the low nibble
    pub const POWER_ICON_CONTRAST: u8 = 0b0101_1100;
    pub const FOLLOWER_CONTROL: u8 = 0b0110_1100;
    /// Contrast bits 3:0 in the low nibble
    pub const CONTRAST_SET: u8 = 0b0111_0000;
    pub const SET_DDRAM_ADDR: u8 = 0b1000_0000;
}

/// Settle time after each transfer
const TRANSFER_SETTLE_US: u32 = 50;

/// LCD driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdError {
    /// D01: Controller did not acknowledge
    NoAck,
    /// D02: Other I2C bus error (arbitration, overrun, ...)
    Bus,
}

impl LcdError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoAck => "D01",
            Self::Bus => "D02",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoAck => "LCD not acknowledging",
            Self::Bus => "I2C bus error",
        }
    }

    fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => Self::NoAck,
            _ => Self::Bus,
        }
    }
}

impl core::fmt::Display for LcdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// DDRAM "set address" instruction for column `x`, row `y`.
///
/// The address wraps in 8 bits; out-of-range positions never panic.
#[inline]
pub const fn position_command(x: u8, y: u8) -> u8 {
    cmd::SET_DDRAM_ADDR | x.wrapping_add(y.wrapping_mul(ROW_STRIDE))
}

/// Pulse the LCD reset line (active low) and wait for the controller.
pub fn hard_reset<P, D>(reset: &mut P, delay: &mut D) -> Result<(), P::Error>
where
    P: OutputPin,
    D: DelayNs,
{
    delay.delay_ms(500);
    reset.set_low()?;
    delay.delay_ms(1);
    reset.set_high()?;
    delay.delay_ms(10);
    Ok(())
}

/// ST7032 driver
///
/// Owns the bus and a delay provider. Blocking: foreground loop only.
pub struct Lcd<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> Lcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create driver at the default address
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: LCD_ADDR,
        }
    }

    /// Give back the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Power-on initialisation sequence
    ///
    /// `contrast` is 6 bits (0..=63), higher is darker.
    pub fn init(&mut self, contrast: u8) -> Result<(), LcdError> {
        self.delay.delay_ms(40);

        self.command(cmd::FUNCTION_SET)?;
        self.command(cmd::FUNCTION_SET_EXT)?;
        self.command(cmd::INTERNAL_OSC)?;
        self.command(cmd::CONTRAST_SET | (contrast & 0x0F))?;
        self.command(cmd::POWER_ICON_CONTRAST | ((contrast >> 4) & 0x03))?;
        self.command(cmd::FOLLOWER_CONTROL)?;

        // Booster needs time to stabilise
        self.delay.delay_ms(300);

        self.command(cmd::FUNCTION_SET)?;
        self.command(cmd::DISPLAY_ON)
    }

    /// Clear display and home cursor
    pub fn clear(&mut self) -> Result<(), LcdError> {
        self.command(cmd::CLEAR)?;
        // Clear needs extra time on top of the transfer settle
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Move cursor to column `x`, row `y`
    pub fn set_pos(&mut self, x: u8, y: u8) -> Result<(), LcdError> {
        self.command(position_command(x, y))
    }

    /// Write a string at the cursor
    pub fn puts(&mut self, s: &str) -> Result<(), LcdError> {
        for b in s.bytes() {
            self.data(b)?;
        }
        Ok(())
    }

    /// Write `text` starting at column 0 of `row`
    pub fn write_line(&mut self, row: u8, text: &str) -> Result<(), LcdError> {
        self.set_pos(0, row)?;
        self.puts(text)
    }

    /// Send an instruction (RS=0)
    pub fn command(&mut self, cmd: u8) -> Result<(), LcdError> {
        self.transfer(CONTROL_COMMAND, cmd)
    }

    /// Send a character (RS=1)
    pub fn data(&mut self, byte: u8) -> Result<(), LcdError> {
        self.transfer(CONTROL_DATA, byte)
    }

    fn transfer(&mut self, control: u8, payload: u8) -> Result<(), LcdError> {
        self.i2c
            .write(self.address, &[control, payload])
            .map_err(|e| LcdError::from_kind(e.kind()))?;
        self.delay.delay_us(TRANSFER_SETTLE_US);
        Ok(())
    }
}
