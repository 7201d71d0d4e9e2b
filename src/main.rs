//! PyunPyun DDS - Main entry point
//!
//! On ESP-IDF: brings up DACs, sample timer, front panel and LCD, then
//! runs the control loop forever (see `firmware.rs`).
//!
//! On the host: runs the synthesis core for a burst of ticks against a
//! recording DAC and prints what the converters and the LCD would show.
//! Usage: `pyunpyun [ticks]` (default: one carrier period at 1 kHz).

#[cfg(target_os = "espidf")]
mod firmware;

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();

    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    let ticks = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(host::default_ticks);

    host::run(ticks);
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use pyunpyun_dds::config::DEFAULT_SETTINGS;
    use pyunpyun_dds::dds::tuning::{frequency_hz, period_ticks};
    use pyunpyun_dds::dds::DacCodes;
    use pyunpyun_dds::hal::{OutputDacs, TimerInterrupt};
    use pyunpyun_dds::{display, fg_info, LogRing, ModulationEngine, SharedParams, SAMPLE_RATE_HZ};

    /// DAC pair that keeps every code written.
    #[derive(Default)]
    struct RecordingDacs {
        primary: Vec<u8>,
        monitor: Vec<u8>,
    }

    impl OutputDacs for RecordingDacs {
        fn write_primary(&mut self, code: u8) {
            self.primary.push(code);
        }

        fn write_monitor(&mut self, code: u8) {
            self.monitor.push(code);
        }
    }

    /// Timer stand-in counting acknowledged ticks.
    #[derive(Default)]
    struct TickCounter(u64);

    impl TimerInterrupt for TickCounter {
        fn acknowledge(&mut self) {
            self.0 += 1;
        }
    }

    /// One carrier period at the power-on frequency.
    pub fn default_ticks() -> usize {
        period_ticks(DEFAULT_SETTINGS.carrier_freq_hz, SAMPLE_RATE_HZ) as usize
    }

    pub fn run(ticks: usize) {
        let log: LogRing = LogRing::new();
        let params = SharedParams::with_settings(&DEFAULT_SETTINGS, SAMPLE_RATE_HZ);
        let mut engine = ModulationEngine::new();
        let mut dacs = RecordingDacs::default();
        let mut timer = TickCounter::default();

        fg_info!(log, 0, "{}", env!("VERSION_STRING"));

        let mut last = DacCodes::default();
        for _ in 0..ticks {
            last = engine.on_sample_tick(&params, &mut dacs, &mut timer);
        }

        let snapshot = params.snapshot();
        fg_info!(
            log,
            timer.0 * 1_000_000 / SAMPLE_RATE_HZ as u64,
            "{} ticks, carrier tw {} ({:.3} Hz) lfo tw {} ({:.3} Hz)",
            timer.0,
            snapshot.carrier_tuning,
            frequency_hz(snapshot.carrier_tuning, SAMPLE_RATE_HZ),
            snapshot.lfo_tuning,
            frequency_hz(snapshot.lfo_tuning, SAMPLE_RATE_HZ)
        );

        let mut out = String::new();
        log.drain_to(&mut out);
        print!("{}", out);

        for line in display::render(&snapshot.settings) {
            println!("|{}|", line.as_str());
        }

        println!("primary:");
        for row in dacs.primary.chunks(16) {
            let codes: Vec<String> = row.iter().map(|c| format!("{:3}", c)).collect();
            println!("  {}", codes.join(" "));
        }

        let lo = dacs.monitor.iter().min().copied().unwrap_or(0);
        let hi = dacs.monitor.iter().max().copied().unwrap_or(0);
        println!("monitor range: {}..={}", lo, hi);
        println!(
            "final phase: carrier {:#010x} lfo {:#010x} (last codes {}/{})",
            engine.state().carrier.phase().value(),
            engine.state().lfo.phase().value(),
            last.primary,
            last.monitor
        );
    }
}
