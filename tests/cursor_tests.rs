//! Step cursor and debounce tests

use rt_step_sequencer::sequencer::{Debouncer, StepCursor};

#[test]
fn test_length_advances_return_to_one() {
    for len in [1u16, 2, 3, 16, 32, 64, 255, 1000] {
        let mut cursor = StepCursor::new(len);
        for _ in 0..len {
            let step = cursor.advance();
            assert!(step >= 1 && step <= len, "len {} produced step {}", len, step);
        }
        assert_eq!(cursor.step(), 1, "len {}", len);
    }
}

#[test]
fn test_step_zero_never_seen() {
    let mut cursor = StepCursor::new(5);
    for _ in 0..100 {
        assert_ne!(cursor.advance(), 0);
        assert!(cursor.index() < 5);
    }
}

#[test]
fn test_advance_by_wraps_large_deltas() {
    let mut cursor = StepCursor::new(64);
    cursor.advance_by(63);
    assert_eq!(cursor.step(), 64);
    cursor.advance_by(1);
    assert_eq!(cursor.step(), 1);
    cursor.advance_by(u16::MAX);
    assert_eq!(cursor.step() as u32, (u16::MAX as u32 % 64) + 1);
}

#[test]
fn test_restart() {
    let mut cursor = StepCursor::new(8);
    cursor.advance_by(5);
    cursor.restart();
    assert_eq!(cursor.step(), 1);
    assert_eq!(cursor.index(), 0);
}

#[test]
fn test_debounce_rejects_chatter() {
    let mut d = Debouncer::new(0, 4);
    // alternating bounce never settles
    for i in 0..=100 {
        assert_eq!(d.update((i % 2) as u8), 0);
    }
    for _ in 0..3 {
        assert_eq!(d.update(1), 0);
    }
    assert_eq!(d.update(1), 1);
    assert_eq!(d.state(), 1);

    d.reset(0);
    assert_eq!(d.state(), 0);
}
