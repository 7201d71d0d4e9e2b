//! LCD driver and status screen tests

use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};

use pyunpyun_dds::config::{Settings, DEFAULT_SETTINGS, LCD_CONTRAST};
use pyunpyun_dds::display::{self, render, SPLASH_SUBTITLE, SPLASH_TITLE};
use pyunpyun_dds::fault::{FaultCode, FaultState};
use pyunpyun_dds::hal::st7032::{hard_reset, position_command};
use pyunpyun_dds::hal::{Lcd, LcdError, LedColor, StatusLed, LCD_ADDR};
use pyunpyun_dds::logging::{LogLevel, LogRing};
use pyunpyun_dds::WaveShape;

/// I2C bus recording every write; optionally fails after N writes.
#[derive(Default)]
struct MockBus {
    writes: Vec<(u8, Vec<u8>)>,
    fail_after: Option<usize>,
    failure: Option<ErrorKind>,
}

impl MockBus {
    fn failing_after(n: usize, kind: ErrorKind) -> Self {
        Self {
            fail_after: Some(n),
            failure: Some(kind),
            ..Default::default()
        }
    }

    /// (control, payload) pairs, checking every write went to the LCD.
    fn pairs(&self) -> Vec<(u8, u8)> {
        self.writes
            .iter()
            .map(|(addr, bytes)| {
                assert_eq!(*addr, LCD_ADDR);
                assert_eq!(bytes.len(), 2);
                (bytes[0], bytes[1])
            })
            .collect()
    }

    fn commands(&self) -> Vec<u8> {
        self.pairs().into_iter().filter(|p| p.0 == 0x00).map(|p| p.1).collect()
    }

    fn text(&self) -> String {
        self.pairs()
            .into_iter()
            .filter(|p| p.0 == 0x40)
            .map(|p| p.1 as char)
            .collect()
    }
}

impl i2c::ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if let (Some(n), Some(kind)) = (self.fail_after, self.failure) {
            if self.writes.len() >= n {
                return Err(kind);
            }
        }
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                self.writes.push((address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

/// Delay provider that only adds up the time asked for.
#[derive(Default)]
struct MockDelay {
    total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

#[derive(Default)]
struct MockPin {
    levels: Vec<bool>,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.push(true);
        Ok(())
    }
}

#[derive(Default)]
struct MockLed {
    history: Vec<LedColor>,
}

impl StatusLed for MockLed {
    fn set(&mut self, color: LedColor) {
        self.history.push(color);
    }
}

fn lcd() -> Lcd<MockBus, MockDelay> {
    Lcd::new(MockBus::default(), MockDelay::default())
}

#[test]
fn test_command_and_data_framing() {
    let mut lcd = lcd();
    lcd.command(0x01).unwrap();
    lcd.data(b'A').unwrap();

    let (bus, delay) = lcd.release();
    assert_eq!(bus.pairs(), [(0x00, 0x01), (0x40, 0x41)]);
    // 50 µs settle after each transfer
    assert_eq!(delay.total_ns, 2 * 50_000);
}

#[test]
fn test_set_pos() {
    assert_eq!(position_command(0, 0), 0x80);
    assert_eq!(position_command(3, 1), 0xC3);

    let mut lcd = lcd();
    lcd.set_pos(1, 1).unwrap();
    let (bus, _) = lcd.release();
    assert_eq!(bus.pairs(), [(0x00, 0xC1)]);
}

#[test]
fn test_init_sequence() {
    let mut lcd = lcd();
    lcd.init(LCD_CONTRAST).unwrap();

    let (bus, delay) = lcd.release();
    assert_eq!(
        bus.commands(),
        [0x38, 0x39, 0x14, 0x70, 0x5E, 0x6C, 0x38, 0x0C]
    );
    // 40 ms power-on + 300 ms booster + 8 × 50 µs
    assert_eq!(delay.total_ns, 340_400_000);
}

#[test]
fn test_contrast_bits_split() {
    let mut lcd = lcd();
    lcd.init(0b11_1010).unwrap();
    let (bus, _) = lcd.release();
    let cmds = bus.commands();
    assert_eq!(cmds[3], 0x70 | 0b1010);
    assert_eq!(cmds[4], 0x5C | 0b11);
}

#[test]
fn test_clear_waits() {
    let mut lcd = lcd();
    lcd.clear().unwrap();
    let (bus, delay) = lcd.release();
    assert_eq!(bus.commands(), [0x01]);
    assert_eq!(delay.total_ns, 2_050_000);
}

#[test]
fn test_no_ack_maps_to_lcd_error() {
    let bus = MockBus::failing_after(0, ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
    let mut lcd = Lcd::new(bus, MockDelay::default());
    assert_eq!(lcd.command(0x01), Err(LcdError::NoAck));
    assert_eq!(lcd.puts("x"), Err(LcdError::NoAck));

    let bus = MockBus::failing_after(0, ErrorKind::ArbitrationLoss);
    let mut lcd = Lcd::new(bus, MockDelay::default());
    assert_eq!(lcd.data(b'x'), Err(LcdError::Bus));
}

#[test]
fn test_init_stops_at_first_failure() {
    let bus = MockBus::failing_after(3, ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
    let mut lcd = Lcd::new(bus, MockDelay::default());
    assert_eq!(lcd.init(LCD_CONTRAST), Err(LcdError::NoAck));
    let (bus, _) = lcd.release();
    assert_eq!(bus.writes.len(), 3);
}

#[test]
fn test_hard_reset_pulse() {
    let mut pin = MockPin::default();
    let mut delay = MockDelay::default();
    hard_reset(&mut pin, &mut delay).unwrap();

    assert_eq!(pin.levels, [false, true]);
    assert_eq!(delay.total_ns, 511_000_000);
}

#[test]
fn test_splash() {
    let mut lcd = lcd();
    display::splash(&mut lcd).unwrap();

    let (bus, _) = lcd.release();
    assert_eq!(bus.commands(), [0x01, 0xC1]);
    assert_eq!(bus.text(), format!("{}{}", SPLASH_TITLE, SPLASH_SUBTITLE));
    assert_eq!(bus.text(), "PyunPyunMachine #3");
}

#[test]
fn test_render_full_scale() {
    let settings = Settings {
        carrier_freq_hz: 999.5,
        lfo_freq_hz: 9.99,
        depth: 255,
        carrier_shape: WaveShape::Triangle,
        lfo_shape: WaveShape::SawUp,
    };
    let [top, bottom] = render(&settings);
    assert_eq!(top.as_str(), "FREQ LFO DPT TRI");
    assert_eq!(bottom.as_str(), " 999  99 255 SW2");
}

#[test]
fn test_render_zero() {
    let settings = Settings {
        carrier_freq_hz: 0.0,
        lfo_freq_hz: 0.0,
        depth: 0,
        ..DEFAULT_SETTINGS
    };
    let [_, bottom] = render(&settings);
    assert_eq!(bottom.as_str(), "   0   0   0 SIN");
}

#[test]
fn test_refresh_success_sets_green() {
    let mut lcd = lcd();
    let fault = FaultState::new();
    let mut led = MockLed::default();
    let log: LogRing<8> = LogRing::new();

    display::refresh(&mut lcd, &DEFAULT_SETTINGS, &fault, &mut led, &log, 0).unwrap();

    let (bus, _) = lcd.release();
    assert_eq!(bus.commands(), [0x80, 0xC0]);
    assert_eq!(bus.text(), "FREQ LFO DPT SIN1000  10 255 SIN");
    assert_eq!(led.history, [LedColor::Green]);
    assert!(!fault.is_active());
    assert_eq!(log.pending(), 0);
}

#[test]
fn test_refresh_failure_sets_red_and_fault() {
    let bus = MockBus::failing_after(5, ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown));
    let mut lcd = Lcd::new(bus, MockDelay::default());
    let fault = FaultState::new();
    let mut led = MockLed::default();
    let log: LogRing<8> = LogRing::new();

    let result = display::refresh(&mut lcd, &DEFAULT_SETTINGS, &fault, &mut led, &log, 1234);

    assert_eq!(result, Err(LcdError::NoAck));
    assert_eq!(led.history, [LedColor::Red]);
    assert_eq!(fault.code(), FaultCode::DisplayNoAck);
    assert_eq!(fault.data(), 0, "failed in the top row");

    let entry = log.drain().unwrap();
    assert_eq!(entry.level, LogLevel::Error);
    assert_eq!(entry.timestamp_us, 1234);
    assert!(entry.text().contains("D01"));
}

#[test]
fn test_refresh_failure_records_bottom_row() {
    // Top row is 17 transfers (address + 16 characters)
    let bus = MockBus::failing_after(20, ErrorKind::Overrun);
    let mut lcd = Lcd::new(bus, MockDelay::default());
    let fault = FaultState::new();
    let mut led = MockLed::default();
    let log: LogRing<8> = LogRing::new();

    let result = display::refresh(&mut lcd, &DEFAULT_SETTINGS, &fault, &mut led, &log, 0);
    assert_eq!(result, Err(LcdError::Bus));

    let snap = fault.snapshot();
    assert!(snap.active);
    assert_eq!(snap.code, FaultCode::DisplayBus);
    assert_eq!(snap.data, 1);
    assert_eq!(snap.count, 1);

    let entry = log.drain().unwrap();
    assert!(entry.text().starts_with("lcd row 1: D02"));
    assert!(entry.text().contains("fault #1"));
}

#[test]
fn test_set_pos_out_of_range_wraps() {
    let mut lcd = lcd();
    lcd.set_pos(3, 5).unwrap();
    lcd.write_line(200, "x").unwrap();

    let (bus, _) = lcd.release();
    // 3 + 5 × 0x40 = 0x143 → 0x43; 200 × 0x40 wraps to 0
    assert_eq!(bus.commands(), [0xC3, 0x80]);
}

#[test]
fn test_refresh_recovers_after_failure() {
    let fault = FaultState::new();
    let mut led = MockLed::default();
    let log: LogRing<8> = LogRing::new();

    let mut broken = Lcd::new(MockBus::failing_after(0, ErrorKind::Bus), MockDelay::default());
    let _ = display::refresh(&mut broken, &DEFAULT_SETTINGS, &fault, &mut led, &log, 0);
    assert_eq!(fault.code(), FaultCode::DisplayBus);

    let mut working = lcd();
    display::refresh(&mut working, &DEFAULT_SETTINGS, &fault, &mut led, &log, 1).unwrap();

    assert!(!fault.is_active());
    assert_eq!(led.history, [LedColor::Red, LedColor::Green]);
}

#[test]
fn test_refresh_keeps_input_fault_red() {
    let mut lcd = lcd();
    let fault = FaultState::new();
    fault.set(FaultCode::InputTimeout, 0);
    let mut led = MockLed::default();
    let log: LogRing<8> = LogRing::new();

    display::refresh(&mut lcd, &DEFAULT_SETTINGS, &fault, &mut led, &log, 0).unwrap();

    assert!(fault.is_active());
    assert_eq!(led.history, [LedColor::Red]);
}
