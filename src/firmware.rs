//! ESP32 board bring-up and foreground loop.
//!
//! Pin map:
//!
//! | Function              | Peripheral         | Pin    |
//! |-----------------------|--------------------|--------|
//! | Carrier output        | DAC channel 0      | GPIO25 |
//! | LFO monitor           | DAC channel 1      | GPIO26 |
//! | Carrier frequency knob| ADC1 channel 6     | GPIO34 |
//! | LFO frequency knob    | ADC1 channel 7     | GPIO35 |
//! | Depth knob            | ADC1 channel 4     | GPIO32 |
//! | Carrier shape button  | input, pull-down   | GPIO18 |
//! | LFO shape button      | input, pull-down   | GPIO19 |
//! | LCD SDA / SCL         | I2C0               | 21 / 22|
//! | LCD reset             | output             | GPIO17 |
//! | LED red / green       | output, active low | 4 / 16 |
//!
//! The sample interrupt is a GPTimer alarm with auto-reload. Its callback
//! runs [`ModulationEngine::on_sample_tick`] and nothing else.

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::ptr;

use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::sys::{self as esp_idf_sys, esp, EspError};

use pyunpyun_dds::config::{DEFAULT_SETTINGS, LCD_CONTRAST};
use pyunpyun_dds::display;
use pyunpyun_dds::hal::st7032::hard_reset;
use pyunpyun_dds::hal::{
    ControlInputs, InputError, KnobReadings, Lcd, LedColor, OutputDacs, StatusLed, TimerInterrupt,
};
use pyunpyun_dds::{fg_error, fg_info, ControlLoop, FaultState, LogRing, ModulationEngine, SharedParams};

/// GPTimer tick rate.
const TIMER_RESOLUTION_HZ: u32 = 10_000_000;

/// Timer ticks per sample. 10 MHz / 208 = 48 076 Hz.
const ALARM_TICKS: u32 = 208;

/// Actual sample rate; tuning words are computed against this.
const SAMPLE_RATE_HZ: u32 = TIMER_RESOLUTION_HZ / ALARM_TICKS;

/// Pause between control cycles. Also lets the idle task feed the watchdog.
const CONTROL_PERIOD_MS: u32 = 20;

/// Banner time before the status screen takes over.
const SPLASH_MS: u32 = 1000;

// Wrapper to make UnsafeCell Sync for the interrupt context.
// SAFETY: written once by the foreground before the timer starts; after
// that only the timer callback touches it.
#[repr(transparent)]
struct SyncCell<T>(UnsafeCell<T>);
unsafe impl<T> Sync for SyncCell<T> {}

impl<T> SyncCell<T> {
    const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    fn get(&self) -> *mut T {
        self.0.get()
    }
}

/// Everything the sample interrupt owns.
struct IsrContext {
    engine: ModulationEngine,
    dacs: EspDacs,
    timer: AlarmAck,
}

static PARAMS: SharedParams = SharedParams::new();
static FAULT_STATE: FaultState = FaultState::new();
static LOG_RING: LogRing = LogRing::new();
static ISR_CONTEXT: SyncCell<Option<IsrContext>> = SyncCell::new(None);

/// DAC pair in oneshot mode.
struct EspDacs {
    primary: esp_idf_sys::dac_oneshot_handle_t,
    monitor: esp_idf_sys::dac_oneshot_handle_t,
}

impl EspDacs {
    fn new() -> Result<Self, EspError> {
        Ok(Self {
            primary: new_dac_channel(esp_idf_sys::dac_channel_t_DAC_CHAN_0)?,
            monitor: new_dac_channel(esp_idf_sys::dac_channel_t_DAC_CHAN_1)?,
        })
    }
}

fn new_dac_channel(chan_id: esp_idf_sys::dac_channel_t) -> Result<esp_idf_sys::dac_oneshot_handle_t, EspError> {
    let config = esp_idf_sys::dac_oneshot_config_t { chan_id };
    let mut handle: esp_idf_sys::dac_oneshot_handle_t = ptr::null_mut();
    // SAFETY: config and handle outlive the call.
    esp!(unsafe { esp_idf_sys::dac_oneshot_new_channel(&config, &mut handle) })?;
    Ok(handle)
}

impl OutputDacs for EspDacs {
    #[inline(always)]
    fn write_primary(&mut self, code: u8) {
        // SAFETY: handle created in EspDacs::new and never freed.
        unsafe {
            esp_idf_sys::dac_oneshot_output_voltage(self.primary, code);
        }
    }

    #[inline(always)]
    fn write_monitor(&mut self, code: u8) {
        // SAFETY: as above.
        unsafe {
            esp_idf_sys::dac_oneshot_output_voltage(self.monitor, code);
        }
    }
}

/// The GPTimer driver clears the alarm status before invoking the callback,
/// so acknowledging is a no-op here.
struct AlarmAck;

impl TimerInterrupt for AlarmAck {
    #[inline(always)]
    fn acknowledge(&mut self) {}
}

unsafe extern "C" fn on_alarm(
    _timer: esp_idf_sys::gptimer_handle_t,
    _event: *const esp_idf_sys::gptimer_alarm_event_data_t,
    _user_ctx: *mut c_void,
) -> bool {
    // SAFETY: ISR_CONTEXT is filled before the timer is started and only
    // this callback accesses it afterwards.
    if let Some(ctx) = (*ISR_CONTEXT.get()).as_mut() {
        ctx.engine
            .on_sample_tick(&PARAMS, &mut ctx.dacs, &mut ctx.timer);
    }
    // No task woken
    false
}

/// Configure and start the sample timer.
fn start_sample_timer() -> Result<esp_idf_sys::gptimer_handle_t, EspError> {
    let mut timer: esp_idf_sys::gptimer_handle_t = ptr::null_mut();

    let config = esp_idf_sys::gptimer_config_t {
        clk_src: esp_idf_sys::soc_periph_gptimer_clk_src_t_GPTIMER_CLK_SRC_DEFAULT,
        direction: esp_idf_sys::gptimer_count_direction_t_GPTIMER_COUNT_UP,
        resolution_hz: TIMER_RESOLUTION_HZ,
        ..Default::default()
    };

    let callbacks = esp_idf_sys::gptimer_event_callbacks_t {
        on_alarm: Some(on_alarm),
    };

    let mut alarm = esp_idf_sys::gptimer_alarm_config_t {
        alarm_count: ALARM_TICKS as u64,
        reload_count: 0,
        ..Default::default()
    };
    alarm.flags.set_auto_reload_on_alarm(1);

    // SAFETY: all configs outlive the calls; the timer handle is kept
    // alive for the life of the program.
    unsafe {
        esp!(esp_idf_sys::gptimer_new_timer(&config, &mut timer))?;
        esp!(esp_idf_sys::gptimer_register_event_callbacks(
            timer,
            &callbacks,
            ptr::null_mut()
        ))?;
        esp!(esp_idf_sys::gptimer_set_alarm_action(timer, &alarm))?;
        esp!(esp_idf_sys::gptimer_enable(timer))?;
        esp!(esp_idf_sys::gptimer_start(timer))?;
    }

    Ok(timer)
}

/// Knobs on ADC1 (oneshot) and the two shape buttons.
struct FrontPanel {
    adc: esp_idf_sys::adc_oneshot_unit_handle_t,
    carrier_button: PinDriver<'static, AnyInputPin, Input>,
    lfo_button: PinDriver<'static, AnyInputPin, Input>,
}

const CARRIER_KNOB: esp_idf_sys::adc_channel_t = esp_idf_sys::adc_channel_t_ADC_CHANNEL_6;
const LFO_KNOB: esp_idf_sys::adc_channel_t = esp_idf_sys::adc_channel_t_ADC_CHANNEL_7;
const DEPTH_KNOB: esp_idf_sys::adc_channel_t = esp_idf_sys::adc_channel_t_ADC_CHANNEL_4;

impl FrontPanel {
    fn new(
        carrier_button: PinDriver<'static, AnyInputPin, Input>,
        lfo_button: PinDriver<'static, AnyInputPin, Input>,
    ) -> Result<Self, EspError> {
        let unit_config = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
            unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
            ..Default::default()
        };
        let channel_config = esp_idf_sys::adc_oneshot_chan_cfg_t {
            atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
        };

        let mut adc: esp_idf_sys::adc_oneshot_unit_handle_t = ptr::null_mut();
        // SAFETY: configs and handle outlive the calls.
        unsafe {
            esp!(esp_idf_sys::adc_oneshot_new_unit(&unit_config, &mut adc))?;
            for channel in [CARRIER_KNOB, LFO_KNOB, DEPTH_KNOB] {
                esp!(esp_idf_sys::adc_oneshot_config_channel(adc, channel, &channel_config))?;
            }
        }

        Ok(Self {
            adc,
            carrier_button,
            lfo_button,
        })
    }

    /// One conversion, rescaled from 12 to 11 bits to match the knob range.
    fn convert(&mut self, channel: esp_idf_sys::adc_channel_t) -> Result<i16, InputError> {
        let mut raw: i32 = 0;
        // SAFETY: unit handle created in FrontPanel::new and never freed.
        match esp!(unsafe { esp_idf_sys::adc_oneshot_read(self.adc, channel, &mut raw) }) {
            Ok(()) => Ok((raw >> 1) as i16),
            Err(e) if e.code() == esp_idf_sys::ESP_ERR_TIMEOUT as esp_idf_sys::esp_err_t => {
                Err(InputError::Timeout)
            }
            Err(_) => Err(InputError::Adc),
        }
    }
}

impl ControlInputs for FrontPanel {
    fn read_knobs(&mut self) -> Result<KnobReadings, InputError> {
        Ok(KnobReadings {
            carrier_freq: self.convert(CARRIER_KNOB)?,
            lfo_freq: self.convert(LFO_KNOB)?,
            depth: self.convert(DEPTH_KNOB)?,
        })
    }

    fn carrier_shape_button(&mut self) -> bool {
        self.carrier_button.is_high()
    }

    fn lfo_shape_button(&mut self) -> bool {
        self.lfo_button.is_high()
    }
}

/// Red/green LED pair, both active low.
struct BicolorLed {
    red: PinDriver<'static, AnyOutputPin, Output>,
    green: PinDriver<'static, AnyOutputPin, Output>,
}

impl StatusLed for BicolorLed {
    fn set(&mut self, color: LedColor) {
        let (red_on, green_on) = match color {
            LedColor::Green => (false, true),
            LedColor::Red => (true, false),
        };
        let _ = self.red.set_level((!red_on).into());
        let _ = self.green.set_level((!green_on).into());
    }
}

fn timestamp_us() -> u64 {
    // SAFETY: esp_timer is started by the IDF before main.
    unsafe { esp_idf_sys::esp_timer_get_time() as u64 }
}

/// Print whatever the log ring holds.
fn drain_log() {
    let mut out = String::new();
    LOG_RING.drain_to(&mut out);
    if !out.is_empty() {
        print!("{}", out);
    }
}

/// Bring the board up and run the control loop forever.
pub fn run() -> Result<(), EspError> {
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    fg_info!(LOG_RING, timestamp_us(), "{}", env!("VERSION_STRING"));

    PARAMS.publish(&DEFAULT_SETTINGS, SAMPLE_RATE_HZ);

    // SAFETY: the timer is not running yet, nothing else can observe this.
    unsafe {
        *ISR_CONTEXT.get() = Some(IsrContext {
            engine: ModulationEngine::new(),
            dacs: EspDacs::new()?,
            timer: AlarmAck,
        });
    }

    let mut carrier_button = PinDriver::input(AnyInputPin::from(pins.gpio18))?;
    carrier_button.set_pull(Pull::Down)?;
    let mut lfo_button = PinDriver::input(AnyInputPin::from(pins.gpio19))?;
    lfo_button.set_pull(Pull::Down)?;
    let mut panel = FrontPanel::new(carrier_button, lfo_button)?;

    let mut led = BicolorLed {
        red: PinDriver::output(AnyOutputPin::from(pins.gpio4))?,
        green: PinDriver::output(AnyOutputPin::from(pins.gpio16))?,
    };
    led.set(LedColor::Green);

    let mut lcd_reset = PinDriver::output(pins.gpio17)?;
    hard_reset(&mut lcd_reset, &mut Ets)?;

    let i2c_config = I2cConfig::new().baudrate(100.kHz().into());
    let i2c = I2cDriver::new(peripherals.i2c0, pins.gpio21, pins.gpio22, &i2c_config)?;
    let mut lcd = Lcd::new(i2c, Ets);

    if let Err(e) = lcd.init(LCD_CONTRAST).and_then(|_| display::splash(&mut lcd)) {
        FAULT_STATE.set(e.into(), timestamp_us() as u32);
        fg_error!(LOG_RING, timestamp_us(), "lcd init: {}", e);
    }
    led.set(FAULT_STATE.indicator());
    drain_log();
    FreeRtos::delay_ms(SPLASH_MS);

    let _sample_timer = start_sample_timer()?;
    fg_info!(LOG_RING, timestamp_us(), "sample timer running at {} Hz", SAMPLE_RATE_HZ);

    let mut control = ControlLoop::new(&DEFAULT_SETTINGS, SAMPLE_RATE_HZ);

    loop {
        let now = timestamp_us();
        let update = control.poll(&mut panel, &PARAMS, &FAULT_STATE, &LOG_RING, now);
        // Failures are already recorded in FAULT_STATE and the log
        let _ = display::refresh(&mut lcd, &update.settings, &FAULT_STATE, &mut led, &LOG_RING, now);
        drain_log();
        FreeRtos::delay_ms(CONTROL_PERIOD_MS);
    }
}
