//! Sawtooth synthesizer tests

use rt_step_sequencer::audio::{quantize, Sawtooth, NOTE_TABLE, PEAK_HIGH, PEAK_LOW};
use rt_step_sequencer::mailbox::{ParamMailbox, SynthParams};

fn params(phase_inc: u16, period: u16) -> SynthParams {
    SynthParams {
        phase_inc,
        period,
        active: true,
        generation: 1,
    }
}

/// One full cycle: `period + 1` samples starting at the low peak.
fn one_cycle(saw: &mut Sawtooth, p: &SynthParams) -> Vec<u8> {
    (0..=p.period).map(|_| saw.tick(p)).collect()
}

#[test]
fn test_ramp_periodicity() {
    let g4 = &NOTE_TABLE[0];
    let c6 = &NOTE_TABLE[10];
    let pairs = [
        (g4.phase_inc, g4.period),
        (c6.phase_inc, c6.period),
        (1 << 7, 10),
    ];

    for (d, p) in pairs {
        let params = params(d, p);
        let mut saw = Sawtooth::new();

        let first = one_cycle(&mut saw, &params);
        assert_eq!(first.len(), p as usize + 1);
        assert_eq!(first[0], PEAK_LOW, "d={} p={}", d, p);
        assert!(first.windows(2).all(|w| w[0] <= w[1]), "ramp rises, d={} p={}", d, p);
        assert_eq!(*first.last().unwrap(), quantize(d * p));

        // next cycle restarts at the low peak and repeats exactly
        let second = one_cycle(&mut saw, &params);
        assert_eq!(first, second, "d={} p={}", d, p);
    }
}

#[test]
fn test_table_notes_reach_full_scale() {
    for note in NOTE_TABLE.iter() {
        let params = params(note.phase_inc, note.period);
        let mut saw = Sawtooth::new();
        let cycle = one_cycle(&mut saw, &params);
        let top = *cycle.iter().max().unwrap();
        assert!(top >= PEAK_HIGH - 1, "{} peaks at {}", note.name, top);
    }
}

#[test]
fn test_unit_increment_is_exact_ramp() {
    let params = params(1 << 7, 10);
    let mut saw = Sawtooth::new();
    let cycle = one_cycle(&mut saw, &params);
    assert_eq!(cycle, (0..=10).collect::<Vec<u8>>());
}

#[test]
fn test_frequency_from_period() {
    let a4 = &NOTE_TABLE[1];
    let f = a4.frequency_hz(37_500);
    assert!((f - 441.18).abs() < 0.1, "A4 at {}", f);
}

#[test]
fn test_mailbox_swap_restarts_ramp() {
    let mailbox = ParamMailbox::new();
    let mut saw = Sawtooth::new();

    mailbox.publish_note(&NOTE_TABLE[5]);
    for _ in 0..30 {
        saw.tick(&mailbox.snapshot());
    }
    assert!(saw.level() > PEAK_LOW);

    mailbox.publish_note(&NOTE_TABLE[0]);
    assert_eq!(saw.tick(&mailbox.snapshot()), PEAK_LOW);

    mailbox.publish_silence();
    for _ in 0..10 {
        assert_eq!(saw.tick(&mailbox.snapshot()), PEAK_LOW);
    }
}
