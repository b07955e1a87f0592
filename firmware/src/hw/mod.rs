//! Board bindings for the Pico W alarm.
//!
//! Pin map:
//! - GP12: indicator LED (push-pull, active high)
//! - GP21: buzzer A, PWM slice 2 channel B
//! - GP10: buzzer B, PWM slice 5 channel A
//! - GP5 / GP6: alarm-on / alarm-off buttons, active low with pull-ups
//! - GP28 (ADC2): USB rail through a 3:1 divider

#![cfg(target_os = "none")]

pub mod power;

use alarm_core::actuator::{AlarmOutputs, BuzzerChannel};
use alarm_core::controller::{ButtonId, ButtonInputs};
use embassy_rp::gpio::{Input, Level, Output};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};

/// PWM wrap value giving a 2 kHz tone at the 125 MHz system clock.
pub const BUZZER_PWM_TOP: u16 = 62_500;
/// Compare value for a 50 % duty cycle.
pub const BUZZER_PWM_DUTY: u16 = BUZZER_PWM_TOP / 2;

/// PWM output a buzzer is attached to within its slice.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PwmOutput {
    A,
    B,
}

/// One buzzer driven by a PWM slice; silence is a zero compare value.
pub struct Buzzer<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
    output: PwmOutput,
}

impl<'d> Buzzer<'d> {
    /// Wraps `pwm` and starts it silent.
    pub fn new(pwm: Pwm<'d>, output: PwmOutput) -> Self {
        let mut buzzer = Self {
            pwm,
            config: buzzer_config(),
            output,
        };
        buzzer.set(false);
        buzzer
    }

    fn set(&mut self, on: bool) {
        let level = if on { BUZZER_PWM_DUTY } else { 0 };
        match self.output {
            PwmOutput::A => self.config.compare_a = level,
            PwmOutput::B => self.config.compare_b = level,
        }
        self.pwm.set_config(&self.config);
    }
}

/// Slice configuration shared by both buzzers.
pub fn buzzer_config() -> PwmConfig {
    let mut config = PwmConfig::default();
    config.top = BUZZER_PWM_TOP;
    config.compare_a = 0;
    config.compare_b = 0;
    config
}

/// LED plus both buzzers.
pub struct PicoOutputs<'d> {
    led: Output<'d>,
    buzzer_a: Buzzer<'d>,
    buzzer_b: Buzzer<'d>,
}

impl<'d> PicoOutputs<'d> {
    pub fn new(led: Output<'d>, buzzer_a: Buzzer<'d>, buzzer_b: Buzzer<'d>) -> Self {
        Self {
            led,
            buzzer_a,
            buzzer_b,
        }
    }
}

impl AlarmOutputs for PicoOutputs<'_> {
    fn set_led(&mut self, on: bool) {
        self.led.set_level(Level::from(on));
    }

    fn set_buzzer_channel(&mut self, channel: BuzzerChannel, on: bool) {
        match channel {
            BuzzerChannel::A => self.buzzer_a.set(on),
            BuzzerChannel::B => self.buzzer_b.set(on),
        }
    }
}

/// Alarm-on and alarm-off push buttons.
pub struct PicoButtons<'d> {
    alarm_on: Input<'d>,
    alarm_off: Input<'d>,
}

impl<'d> PicoButtons<'d> {
    /// Both inputs must be configured with pull-ups; pressed reads low.
    pub fn new(alarm_on: Input<'d>, alarm_off: Input<'d>) -> Self {
        Self {
            alarm_on,
            alarm_off,
        }
    }
}

impl ButtonInputs for PicoButtons<'_> {
    fn read_button(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::AlarmOn => self.alarm_on.is_low(),
            ButtonId::AlarmOff => self.alarm_off.is_low(),
        }
    }
}
