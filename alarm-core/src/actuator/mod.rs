//! Beep/silence sequencing for the LED and buzzer outputs.
//!
//! The actuator never sleeps. Each [`Actuator::tick`] advances the pattern
//! to `now` and returns how long the current phase has left, which the
//! control loop uses to bound its next wait. A disarm between two ticks is
//! therefore acted on within one wait, and [`Actuator::silence`] drops the
//! outputs immediately regardless of where the cycle was.

use core::ops::Add;
use core::time::Duration;

use crate::config::AlarmConfig;
use crate::telemetry::TelemetryInstant;

/// Buzzer channels wired on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuzzerChannel {
    A,
    B,
}

/// Both buzzer channels, in drive order.
pub const ALL_BUZZERS: [BuzzerChannel; 2] = [BuzzerChannel::A, BuzzerChannel::B];

/// Abstraction over the physical alarm outputs.
pub trait AlarmOutputs {
    /// Switches the indicator LED.
    fn set_led(&mut self, on: bool);

    /// Enables or disables one buzzer channel.
    fn set_buzzer_channel(&mut self, channel: BuzzerChannel, on: bool);
}

/// Outputs that perform no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutputs;

impl AlarmOutputs for NoopOutputs {
    fn set_led(&mut self, _: bool) {}

    fn set_buzzer_channel(&mut self, _: BuzzerChannel, _: bool) {}
}

/// Half of the alarm waveform.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BeepPhase {
    Beep,
    Silence,
}

#[derive(Copy, Clone, Debug)]
struct ActuationCycle<I> {
    phase: BeepPhase,
    ends_at: I,
}

/// Drives the LED and buzzers in a repeating beep/silence pattern.
pub struct Actuator<O, I> {
    outputs: O,
    beep_on: Duration,
    beep_off: Duration,
    cycle: Option<ActuationCycle<I>>,
    energized: bool,
}

impl<O, I> Actuator<O, I>
where
    O: AlarmOutputs,
    I: TelemetryInstant + Ord + Add<Duration, Output = I>,
{
    /// Creates an idle actuator; outputs are forced off immediately.
    pub fn new(mut outputs: O, beep_on: Duration, beep_off: Duration) -> Self {
        write_all(&mut outputs, false);
        Self {
            outputs,
            beep_on,
            beep_off,
            cycle: None,
            energized: false,
        }
    }

    /// Creates an actuator using the beep cadence from `config`.
    pub fn from_config(outputs: O, config: &AlarmConfig) -> Self {
        Self::new(outputs, config.beep_on(), config.beep_off())
    }

    /// Advances the pattern to `now` and returns the time left in the phase.
    ///
    /// The first tick after [`Actuator::silence`] starts a fresh cycle with
    /// a beep. If ticks stop for longer than a whole cycle the pattern
    /// restarts at `now` rather than replaying missed phases.
    pub fn tick(&mut self, now: I) -> Duration {
        let period = self.beep_on + self.beep_off;
        let mut cycle = match self.cycle {
            Some(cycle) => cycle,
            None => self.fresh_cycle(now),
        };

        while now >= cycle.ends_at {
            if now.saturating_duration_since(cycle.ends_at) >= period {
                cycle = self.fresh_cycle(now);
                break;
            }

            cycle.phase = match cycle.phase {
                BeepPhase::Beep => BeepPhase::Silence,
                BeepPhase::Silence => BeepPhase::Beep,
            };
            cycle.ends_at = cycle.ends_at + self.phase_length(cycle.phase);
        }

        self.cycle = Some(cycle);
        self.drive(cycle.phase == BeepPhase::Beep);
        cycle.ends_at.saturating_duration_since(now)
    }

    /// Forces every output off and discards the current cycle.
    ///
    /// Returns `true` when a cycle was in progress.
    pub fn silence(&mut self) -> bool {
        let was_active = self.cycle.is_some() || self.energized;
        write_all(&mut self.outputs, false);
        self.energized = false;
        self.cycle = None;
        was_active
    }

    /// Current phase, or `None` when idle.
    pub fn phase(&self) -> Option<BeepPhase> {
        self.cycle.map(|cycle| cycle.phase)
    }

    /// Returns `true` while the LED and buzzers are switched on.
    pub const fn is_energized(&self) -> bool {
        self.energized
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut O {
        &mut self.outputs
    }

    fn fresh_cycle(&self, now: I) -> ActuationCycle<I> {
        ActuationCycle {
            phase: BeepPhase::Beep,
            ends_at: now + self.beep_on,
        }
    }

    fn phase_length(&self, phase: BeepPhase) -> Duration {
        match phase {
            BeepPhase::Beep => self.beep_on,
            BeepPhase::Silence => self.beep_off,
        }
    }

    fn drive(&mut self, on: bool) {
        if self.energized != on {
            write_all(&mut self.outputs, on);
            self.energized = on;
        }
    }
}

fn write_all<O: AlarmOutputs>(outputs: &mut O, on: bool) {
    outputs.set_led(on);
    for channel in ALL_BUZZERS {
        outputs.set_buzzer_channel(channel, on);
    }
}
