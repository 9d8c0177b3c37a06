//! RtStepSequencer - main entry point
//!
//! On the host this runs both variants against simulated interrupts:
//!
//! 1. `remote`: a partner device clocks the sequencer with command bytes
//!    over a simulated wire and prints the forwarded bytes
//! 2. `local`: a button press plays the first program through the
//!    sawtooth synth and prints each decoded step
//!
//! On ESP-IDF the same engine is wired to GPIO, LEDC and hardware timers.

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("{}", env!("VERSION_STRING"));
    let variant = std::env::args().nth(1).unwrap_or_else(|| "both".into());
    match variant.as_str() {
        "remote" => sim::run_remote(),
        "local" => sim::run_local(),
        "both" => {
            sim::run_remote();
            sim::run_local();
        }
        other => {
            eprintln!("unknown variant '{}', expected remote | local | both", other);
            std::process::exit(2);
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    esp_idf_svc::sys::link_patches();
    println!("{}", env!("VERSION_STRING"));
    esp::run()
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use rt_step_sequencer::audio::NOTE_TABLE;
    use rt_step_sequencer::config::{EngineConfig, RuntimeConfig, START_BIT};
    use rt_step_sequencer::hal::{ClockTrim, SimTrim};
    use rt_step_sequencer::log_drain;
    use rt_step_sequencer::sequencer::{
        AudioIsr, LocalShared, RemoteShared, TempoSelect, TEMPO_BUTTON,
    };
    use rt_step_sequencer::{
        Calibrator, LocalSequencer, RemoteSequencer, SerialIsr, SerialLink, StepAction, CONFIG,
        LOCAL_PROGRAMS, REMOTE_PROGRAMS,
    };

    static DEVICE: RemoteShared = RemoteShared::new();
    static PARTNER: SerialLink = SerialLink::new();
    static REMOTE_CONFIG: RuntimeConfig = RuntimeConfig::new(&EngineConfig::REMOTE_ATTINY85);

    static LOCAL: LocalShared = LocalShared::new(EngineConfig::LOCAL_ATTINY13.step_interval);

    /// Factory trim of the simulated chip.
    const SIM_FACTORY_TRIM: u8 = 0x5A;

    fn drain_logs() {
        let mut out = String::new();
        if log_drain::drain_globals(&mut out).is_ok() {
            print!("{}", out);
        }
    }

    pub fn run_remote() {
        let config = EngineConfig::REMOTE_ATTINY85;
        if let Err(e) = config.validate() {
            eprintln!("[{}] {}", e.code(), e);
            return;
        }
        let timing = config.bit_timing();
        println!(
            "== remote: {} baud, {} ticks/bit, {} ppm ==",
            timing.baud, config.oversample, timing.error_ppm
        );

        let mut device_isr = SerialIsr::new(config.oversample, config.stop_bits);
        let mut partner_isr = SerialIsr::new(config.oversample, config.stop_bits);
        let mut seq = RemoteSequencer::new(&REMOTE_PROGRAMS, config.group_bits);
        seq.sync_config(&REMOTE_CONFIG);

        DEVICE.link.initialize();
        PARTNER.initialize();

        let start = config.group_bits | START_BIT;
        let stop = config.group_bits;
        let mut script = vec![0x28u8, start];
        script.extend(std::iter::repeat(start).take(REMOTE_PROGRAMS.program_len() + 2));
        script.push(stop);

        let frame_ticks = config.oversample as usize * 24;
        let mut device_tx = true;
        let mut partner_tx = true;
        let mut forwarded = Vec::new();

        for &command in &script {
            PARTNER.send(command);
            for _ in 0..frame_ticks {
                partner_tx = partner_isr.tick(&PARTNER, device_tx);
                device_tx = DEVICE.serial_tick(&mut device_isr, partner_tx);
                seq.poll(&DEVICE);
                if PARTNER.has_new_data() {
                    forwarded.push(PARTNER.read_byte());
                }
            }
        }

        println!("forwarded: {:?}", String::from_utf8_lossy(&forwarded));
        println!("pwm level after stop: {}", DEVICE.pwm_level());
        println!("device diagnostics: {:?}", DEVICE.link.diagnostics.snapshot());
        drain_logs();
    }

    pub fn run_local() {
        let config = EngineConfig::LOCAL_ATTINY13;
        if let Err(e) = config.validate() {
            eprintln!("[{}] {}", e.code(), e);
            return;
        }
        println!(
            "== local: {} Hz sample rate, {} samples/step ==",
            config.sample_rate_hz, config.step_interval
        );

        let mut trim = SimTrim::new(SIM_FACTORY_TRIM);
        let calibrator = Calibrator::from_trim(&trim, config.trim_offset);
        let mut seq = LocalSequencer::new(&LOCAL_PROGRAMS, calibrator, config.debounce_polls)
            .with_tempo(TempoSelect::new(config.sample_rate_hz, config.tempo_debounce_polls));
        let mut isr = AudioIsr::new();
        seq.sync_config(&LOCAL, &CONFIG);

        let steps = LOCAL_PROGRAMS.program_len() as u32;
        let press = config.step_interval as u32 * steps + config.debounce_polls as u32;
        let release = config.debounce_polls as u32 + 1;
        let tempo_hold = config.tempo_debounce_polls as u32;
        let mut peak = 0u8;

        for sample in 0..press + release {
            let mut buttons = if sample < press { 0b01 } else { 0b00 };
            // one tempo step halfway through
            if (press / 2..press / 2 + tempo_hold).contains(&sample) {
                buttons |= TEMPO_BUTTON;
            }
            peak = peak.max(isr.tick(&LOCAL));
            if let Some(event) = seq.poll(&LOCAL, buttons, &mut trim) {
                let rate = trim.scaled_hz(config.sample_rate_hz);
                match event.action() {
                    StepAction::Note(note) => println!(
                        "step {:2}: {} {:.1} Hz (trim {})",
                        event.step,
                        note.name,
                        note.frequency_hz(rate),
                        trim.read()
                    ),
                    StepAction::Silence => println!("step {:2}: rest", event.step),
                    StepAction::Calibrate(d) => println!("step {:2}: fine tune {:+}", event.step, d),
                }
            }
            if sample % 4096 == 0 {
                drain_logs();
            }
        }

        println!(
            "state {:?}, tempo {:?} steps/s, peak level {}, trim writes {}, notes in table {}",
            seq.state(),
            seq.tempo(),
            peak,
            trim.writes(),
            NOTE_TABLE.len()
        );
        drain_logs();
    }
}

#[cfg(target_os = "espidf")]
mod esp {
    //! ESP-IDF binding.
    //!
    //! `SEQUENCER_VARIANT=local` at build time selects the audio variant,
    //! anything else the remote variant. Timer interrupts run the ISR
    //! bodies; the main task polls.
    //!
    //! ESP32 has no instruction-clock trim. [`AlarmTrim`] stretches the
    //! audio timer alarm instead, so the serial timer is not affected.

    use esp_idf_svc::hal::gpio::{PinDriver, Pull};
    use esp_idf_svc::hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;
    use esp_idf_svc::hal::timer::{config::Config, TimerDriver};
    use esp_idf_svc::sys::EspError;

    use rt_step_sequencer::config::{EngineConfig, CONFIG};
    use rt_step_sequencer::hal::{ClockTrim, PinMap, PwmConfig, SimTrim};
    use rt_step_sequencer::log_drain;
    use rt_step_sequencer::sequencer::{
        AudioIsr, LocalShared, RemoteShared, TempoSelect, TEMPO_BUTTON,
    };
    use rt_step_sequencer::{
        Calibrator, LocalSequencer, RemoteSequencer, SerialIsr, LOCAL_PROGRAMS, REMOTE_PROGRAMS,
    };

    static REMOTE: RemoteShared = RemoteShared::new();
    static LOCAL: LocalShared = LocalShared::new(EngineConfig::LOCAL_ATTINY13.step_interval);

    /// Nominal trim value; the alarm is exact at this setting.
    const NOMINAL_TRIM: u8 = 0x80;

    struct Stdout;

    impl core::fmt::Write for Stdout {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            print!("{}", s);
            Ok(())
        }
    }

    /// Trim register emulated by rescaling the audio timer alarm.
    struct AlarmTrim<'a, 'd> {
        timer: &'a mut TimerDriver<'d>,
        nominal_alarm: u64,
        value: u8,
    }

    impl ClockTrim for AlarmTrim<'_, '_> {
        fn factory(&self) -> u8 {
            NOMINAL_TRIM
        }

        fn read(&self) -> u8 {
            self.value
        }

        fn write(&mut self, value: u8) {
            self.value = value;
            let ppm = (value as i64 - NOMINAL_TRIM as i64) * SimTrim::DEFAULT_STEP_PPM as i64;
            let alarm = self.nominal_alarm as i64 * 1_000_000 / (1_000_000 + ppm);
            let _ = self.timer.set_alarm(alarm.max(1) as u64);
        }
    }

    pub fn run() -> Result<(), EspError> {
        match option_env!("SEQUENCER_VARIANT") {
            Some("local") => run_local(),
            _ => run_remote(),
        }
    }

    fn run_remote() -> Result<(), EspError> {
        let config = EngineConfig::REMOTE_ATTINY85;
        let map = PinMap::REMOTE;
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        let mut tx = PinDriver::output(pins.gpio17)?;
        tx.set_high()?;
        let mut rx = PinDriver::input(pins.gpio18)?;
        rx.set_pull(Pull::Up)?;
        let mut transceiver_enable = PinDriver::output(pins.gpio8)?;
        transceiver_enable.set_low()?;
        println!("remote pins: {:?}", map);

        let pwm = PwmConfig::mirror();
        let ledc_timer = LedcTimerDriver::new(
            peripherals.ledc.timer0,
            &TimerConfig::default()
                .frequency(pwm.carrier_hz.Hz().into())
                .resolution(Resolution::Bits8),
        )?;
        let mut mirror = LedcDriver::new(peripherals.ledc.channel0, &ledc_timer, pins.gpio4)?;

        REMOTE.link.initialize();
        let mut isr = SerialIsr::new(config.oversample, config.stop_bits);

        let mut timer = TimerDriver::new(peripherals.timer00, &Config::new().auto_reload(true))?;
        timer.set_alarm(timer.tick_hz() / config.serial_tick_hz as u64)?;
        // SAFETY: the callback only touches atomics, critical-section data and its own pins.
        unsafe {
            timer.subscribe(move || {
                let level = REMOTE.serial_tick(&mut isr, rx.is_high());
                let _ = if level { tx.set_high() } else { tx.set_low() };
            })?;
        }
        timer.enable_interrupt()?;
        timer.enable_alarm(true)?;
        timer.enable(true)?;

        let mut seq = RemoteSequencer::new(&REMOTE_PROGRAMS, config.group_bits);
        let mut last_level = 0u8;
        let mut polls = 0u32;

        loop {
            seq.sync_config(&CONFIG);
            seq.poll(&REMOTE);

            let level = REMOTE.pwm_level();
            if level != last_level {
                mirror.set_duty(pwm.duty_for(level))?;
                last_level = level;
            }

            polls = polls.wrapping_add(1);
            if polls % 10_000 == 0 {
                let _ = log_drain::drain_globals(&mut Stdout);
            }
        }
    }

    fn run_local() -> Result<(), EspError> {
        let config = EngineConfig::LOCAL_ATTINY13;
        let map = PinMap::LOCAL;
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        let mut first = PinDriver::input(pins.gpio5)?;
        first.set_pull(Pull::Up)?;
        let mut second = PinDriver::input(pins.gpio6)?;
        second.set_pull(Pull::Up)?;
        let mut tempo = PinDriver::input(pins.gpio7)?;
        tempo.set_pull(Pull::Up)?;
        println!("local pins: {:?}", map);

        let pwm = PwmConfig::audio(config.sample_rate_hz);
        let ledc_timer = LedcTimerDriver::new(
            peripherals.ledc.timer0,
            &TimerConfig::default()
                .frequency(pwm.carrier_hz.Hz().into())
                .resolution(Resolution::Bits8),
        )?;
        let mut dac = LedcDriver::new(peripherals.ledc.channel0, ledc_timer, pins.gpio4)?;

        let mut isr = AudioIsr::new();
        let mut timer = TimerDriver::new(peripherals.timer00, &Config::new().auto_reload(true))?;
        let nominal_alarm = timer.tick_hz() / pwm.update_hz as u64;
        timer.set_alarm(nominal_alarm)?;
        // SAFETY: the callback only touches critical-section data and its own LEDC channel.
        unsafe {
            timer.subscribe(move || {
                let level = isr.tick(&LOCAL);
                let _ = dac.set_duty(pwm.duty_for(level));
            })?;
        }
        timer.enable_interrupt()?;
        timer.enable_alarm(true)?;
        timer.enable(true)?;

        let mut trim = AlarmTrim {
            timer: &mut timer,
            nominal_alarm,
            value: NOMINAL_TRIM,
        };
        let calibrator = Calibrator::from_trim(&trim, config.trim_offset);
        let mut seq = LocalSequencer::new(&LOCAL_PROGRAMS, calibrator, config.debounce_polls)
            .with_tempo(TempoSelect::new(config.sample_rate_hz, config.tempo_debounce_polls));
        let mut polls = 0u32;

        loop {
            seq.sync_config(&LOCAL, &CONFIG);
            let mut buttons = PinMap::selector_from_levels(first.is_high(), second.is_high());
            if tempo.is_low() {
                buttons |= TEMPO_BUTTON;
            }
            seq.poll(&LOCAL, buttons, &mut trim);

            polls = polls.wrapping_add(1);
            if polls % 10_000 == 0 {
                let _ = log_drain::drain_globals(&mut Stdout);
            }
        }
    }
}
