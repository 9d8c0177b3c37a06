//! Internal step clock for the locally clocked variant.
//!
//! The audio interrupt calls [`StepClock::tick`] every sample; every
//! `interval` samples it emits one pulse. The poll loop compares the pulse
//! counter against its last value, it never writes it except on start/stop.

use core::cell::Cell;

use critical_section::Mutex;

/// Slowest supported step rate.
pub const MIN_STEPS_PER_SEC: u16 = 8;

/// Fastest supported step rate.
pub const MAX_STEPS_PER_SEC: u16 = 16;

/// Tempo presets between [`MIN_STEPS_PER_SEC`] and [`MAX_STEPS_PER_SEC`].
pub const TEMPO_COUNT: usize = (MAX_STEPS_PER_SEC - MIN_STEPS_PER_SEC + 1) as usize;

/// Samples per step for a step rate.
pub const fn interval_for(sample_rate: u32, steps_per_sec: u16) -> u16 {
    let steps = if steps_per_sec == 0 { 1 } else { steps_per_sec as u32 };
    let interval = sample_rate / steps;
    if interval == 0 {
        1
    } else if interval > u16::MAX as u32 {
        u16::MAX
    } else {
        interval as u16
    }
}

/// Interval table for 8..=16 steps per second.
pub const fn tempo_table(sample_rate: u32) -> [u16; TEMPO_COUNT] {
    let mut table = [0u16; TEMPO_COUNT];
    let mut i = 0;
    while i < TEMPO_COUNT {
        table[i] = interval_for(sample_rate, MIN_STEPS_PER_SEC + i as u16);
        i += 1;
    }
    table
}

/// Held-button tempo selector.
///
/// While the button stays pressed, every `threshold` polls steps to the
/// next preset, wrapping from the fastest back to the slowest. Releasing
/// the button restarts the count.
#[derive(Clone, Copy, Debug)]
pub struct TempoSelect {
    table: [u16; TEMPO_COUNT],
    index: usize,
    threshold: u16,
    count: u16,
}

impl TempoSelect {
    /// Start at the slowest preset.
    pub const fn new(sample_rate: u32, threshold: u16) -> Self {
        Self {
            table: tempo_table(sample_rate),
            index: 0,
            threshold: if threshold == 0 { 1 } else { threshold },
            count: 0,
        }
    }

    /// Feed one poll. Returns the new interval when the preset changes.
    pub fn update(&mut self, pressed: bool) -> Option<u16> {
        if !pressed {
            self.count = 0;
            return None;
        }
        self.count += 1;
        if self.count < self.threshold {
            return None;
        }
        self.count = 0;
        self.index = (self.index + 1) % TEMPO_COUNT;
        Some(self.table[self.index])
    }

    /// Samples per step at the current preset.
    #[inline]
    pub fn interval(&self) -> u16 {
        self.table[self.index]
    }

    #[inline]
    pub fn steps_per_sec(&self) -> u16 {
        MIN_STEPS_PER_SEC + self.index as u16
    }
}

#[derive(Clone, Copy, Debug)]
struct ClockState {
    running: bool,
    interval: u16,
    count: u16,
    pulses: u16,
}

/// Sample-counting step clock.
pub struct StepClock {
    state: Mutex<Cell<ClockState>>,
}

impl StepClock {
    pub const fn new(interval: u16) -> Self {
        Self {
            state: Mutex::new(Cell::new(ClockState {
                running: false,
                interval: if interval == 0 { 1 } else { interval },
                count: 0,
                pulses: 0,
            })),
        }
    }

    /// Count one sample (audio ISR). Returns `true` on a pulse.
    #[inline]
    pub fn tick(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            if !s.running {
                return false;
            }
            s.count += 1;
            let pulse = s.count >= s.interval;
            if pulse {
                s.count = 0;
                s.pulses = s.pulses.wrapping_add(1);
            }
            cell.set(s);
            pulse
        })
    }

    /// Start counting from zero.
    pub fn start(&self) {
        self.update(|s| {
            s.running = true;
            s.count = 0;
            s.pulses = 0;
        });
    }

    /// Stop and clear the interval counter and pulses.
    pub fn stop(&self) {
        self.update(|s| {
            s.running = false;
            s.count = 0;
            s.pulses = 0;
        });
    }

    /// Change samples per step. Zero is ignored.
    pub fn set_interval(&self, interval: u16) {
        if interval == 0 {
            return;
        }
        self.update(|s| s.interval = interval);
    }

    /// Pulses since start (wrapping).
    #[inline]
    pub fn pulses(&self) -> u16 {
        critical_section::with(|cs| self.state.borrow(cs).get().pulses)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().running)
    }

    #[inline]
    pub fn interval(&self) -> u16 {
        critical_section::with(|cs| self.state.borrow(cs).get().interval)
    }

    fn update(&self, f: impl FnOnce(&mut ClockState)) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            f(&mut s);
            cell.set(s);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_table_matches_presets() {
        let t = tempo_table(31_250);
        assert_eq!(t[0], 3906);
        assert_eq!(t[8], 1953);
        assert_eq!(interval_for(37_500, 8), 4687);
    }

    #[test]
    fn test_tempo_select_repeats_while_held() {
        let mut tempo = TempoSelect::new(31_250, 3);
        assert_eq!(tempo.steps_per_sec(), 8);

        assert_eq!(tempo.update(true), None);
        assert_eq!(tempo.update(true), None);
        assert_eq!(tempo.update(true), Some(3472));
        assert_eq!(tempo.steps_per_sec(), 9);

        // release restarts the count
        tempo.update(true);
        tempo.update(false);
        tempo.update(true);
        tempo.update(true);
        assert_eq!(tempo.steps_per_sec(), 9);

        for _ in 0..3 * (TEMPO_COUNT - 1) {
            tempo.update(true);
        }
        assert_eq!(tempo.steps_per_sec(), MIN_STEPS_PER_SEC);
        assert_eq!(tempo.interval(), 3906);
    }

    #[test]
    fn test_clock_pulses_every_interval() {
        let clock = StepClock::new(4);
        assert!(!clock.tick(), "stopped clock does not count");

        clock.start();
        let pulses: usize = (0..12).filter(|_| clock.tick()).count();
        assert_eq!(pulses, 3);
        assert_eq!(clock.pulses(), 3);

        clock.stop();
        assert_eq!(clock.pulses(), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_zero_interval_ignored() {
        let clock = StepClock::new(0);
        assert_eq!(clock.interval(), 1);
        clock.set_interval(0);
        assert_eq!(clock.interval(), 1);
        clock.set_interval(100);
        assert_eq!(clock.interval(), 100);
    }
}
