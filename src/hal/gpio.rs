//! Pin roles for both board variants.

/// Pin assignment. Numbers are chip GPIO numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// Serial transmit, idle high.
    pub serial_tx: Option<i32>,
    /// Serial receive, input with pull-up.
    pub serial_rx: Option<i32>,
    /// Audio / level PWM output.
    pub pwm_out: i32,
    /// Program selector buttons, active low with pull-ups.
    pub buttons: Option<[i32; 2]>,
    /// Tempo button, active low with pull-up.
    pub tempo_button: Option<i32>,
    /// Line transceiver enable, driven low at init and held.
    pub transceiver_enable: Option<i32>,
}

impl PinMap {
    /// Remote-clocked board: serial in/out, PWM mirror, transceiver.
    pub const REMOTE: Self = Self {
        serial_tx: Some(17),
        serial_rx: Some(18),
        pwm_out: 4,
        buttons: None,
        tempo_button: None,
        transceiver_enable: Some(8),
    };

    /// Local-clocked board: selector and tempo buttons, audio PWM, serial tx only.
    pub const LOCAL: Self = Self {
        serial_tx: Some(17),
        serial_rx: None,
        pwm_out: 4,
        buttons: Some([5, 6]),
        tempo_button: Some(7),
        transceiver_enable: None,
    };

    /// Two active-low button levels to the selector value (0..=3).
    #[inline]
    pub fn selector_from_levels(first_high: bool, second_high: bool) -> u8 {
        (!first_high as u8) | ((!second_high as u8) << 1)
    }
}
