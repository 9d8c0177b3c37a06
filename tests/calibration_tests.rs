//! Clock calibration tests

use rt_step_sequencer::audio::NOTE_TABLE;
use rt_step_sequencer::calibration::{Calibrator, FINE_TUNE_LIMIT};
use rt_step_sequencer::config::EngineConfig;
use rt_step_sequencer::hal::{ClockTrim, SimTrim};
use rt_step_sequencer::serial::timing::oversample_error_ppm;

#[test]
fn test_baseline_from_board_preset() {
    let trim = SimTrim::new(0x5A);
    let local = Calibrator::from_trim(&trim, EngineConfig::LOCAL_ATTINY13.trim_offset);
    let remote = Calibrator::from_trim(&trim, EngineConfig::REMOTE_ATTINY85.trim_offset);
    assert_eq!(local.baseline(), 0x5D);
    assert_eq!(remote.baseline(), 0x56);
}

#[test]
fn test_every_note_trim_applies() {
    let mut trim = SimTrim::new(128);
    let mut cal = Calibrator::from_trim(&trim, 0);
    cal.apply(&mut trim);

    for note in NOTE_TABLE.iter() {
        cal.set_note_trim(note.trim);
        cal.apply(&mut trim);
        assert_eq!(trim.read() as i16, 128 + note.trim as i16, "{}", note.name);
    }
}

#[test]
fn test_write_only_on_change() {
    let mut trim = SimTrim::new(64);
    let mut cal = Calibrator::from_trim(&trim, 0);

    cal.apply(&mut trim);
    for _ in 0..10 {
        cal.set_note_trim(1);
        cal.set_fine_tune(-1);
        cal.apply(&mut trim);
    }
    // initial write, then +1 -1 sums to the same value
    assert_eq!(trim.writes(), 1);
}

#[test]
fn test_saturates_instead_of_wrapping() {
    let mut trim = SimTrim::new(254);
    let mut cal = Calibrator::from_trim(&trim, 1);
    cal.set_note_trim(1);
    cal.set_fine_tune(FINE_TUNE_LIMIT);
    cal.apply(&mut trim);
    assert_eq!(trim.read(), u8::MAX);

    let mut trim = SimTrim::new(1);
    let mut cal = Calibrator::from_trim(&trim, -1);
    cal.set_note_trim(-1);
    cal.set_fine_tune(-FINE_TUNE_LIMIT);
    cal.apply(&mut trim);
    assert_eq!(trim.read(), 0);
}

#[test]
fn test_trim_moves_audio_and_serial_together() {
    let config = EngineConfig::REMOTE_ATTINY85;
    let mut trim = SimTrim::new(100);
    trim.write(102);

    let sample_rate = trim.scaled_hz(config.sample_rate_hz);
    let serial_tick = trim.scaled_hz(config.serial_tick_hz);

    // same relative shift on both timers
    let audio_shift = sample_rate as f64 / config.sample_rate_hz as f64;
    let serial_shift = serial_tick as f64 / config.serial_tick_hz as f64;
    assert!((audio_shift - serial_shift).abs() < 1e-3);

    // a small trim keeps the link inside receiver tolerance
    assert!(oversample_error_ppm(serial_tick, config.baud, config.oversample) < 20_000);
}
