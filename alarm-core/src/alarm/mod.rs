//! Alarm arbitration.
//!
//! Three independent sources can arm the alarm: the manual buttons, the
//! remote control endpoint, and the power presence detector. Only the
//! buttons and the remote endpoint can disarm it; power coming back does
//! not clear an alarm, since the loss may have been tampering. The
//! transition table is total, so [`AlarmStateMachine::apply`] never fails.

use core::fmt;

use crate::presence::PresenceEvent;

/// Authoritative alarm state.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum AlarmState {
    Armed,
    #[default]
    Disarmed,
}

impl AlarmState {
    #[must_use]
    pub const fn is_armed(self) -> bool {
        matches!(self, AlarmState::Armed)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmState::Armed => f.write_str("armed"),
            AlarmState::Disarmed => f.write_str("disarmed"),
        }
    }
}

/// Decoded `SET_ALARM` command delivered by the control endpoint.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RemoteCommand {
    Arm,
    Disarm,
}

/// Origin of an input that changed the alarm state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TriggerSource {
    Button,
    Remote,
    PowerMonitor,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Button => f.write_str("button"),
            TriggerSource::Remote => f.write_str("remote"),
            TriggerSource::PowerMonitor => f.write_str("power-monitor"),
        }
    }
}

/// Every input the state machine accepts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlarmInput {
    ManualOn,
    ManualOff,
    Remote(RemoteCommand),
    Presence(PresenceEvent),
}

impl AlarmInput {
    /// Source attributed to this input.
    #[must_use]
    pub const fn source(self) -> TriggerSource {
        match self {
            AlarmInput::ManualOn | AlarmInput::ManualOff => TriggerSource::Button,
            AlarmInput::Remote(_) => TriggerSource::Remote,
            AlarmInput::Presence(_) => TriggerSource::PowerMonitor,
        }
    }
}

impl From<RemoteCommand> for AlarmInput {
    fn from(command: RemoteCommand) -> Self {
        AlarmInput::Remote(command)
    }
}

impl From<PresenceEvent> for AlarmInput {
    fn from(event: PresenceEvent) -> Self {
        AlarmInput::Presence(event)
    }
}

/// Result of applying an [`AlarmInput`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// DISARMED -> ARMED.
    Armed { source: TriggerSource },
    /// ARMED -> DISARMED; the actuator must be silenced.
    Disarmed { source: TriggerSource },
    /// Input was a no-op in the current state.
    Unchanged(AlarmState),
}

impl Transition {
    /// Returns `true` when the state actually changed.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Transition::Unchanged(_))
    }

    /// Returns `true` when the actuator must be forced off.
    #[must_use]
    pub const fn requires_silence(self) -> bool {
        matches!(self, Transition::Disarmed { .. })
    }
}

/// ARMED/DISARMED arbiter with a single mutation point.
#[derive(Clone, Debug, Default)]
pub struct AlarmStateMachine {
    state: AlarmState,
    armed_by: Option<TriggerSource>,
}

impl AlarmStateMachine {
    /// Creates a disarmed state machine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AlarmState::Disarmed,
            armed_by: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AlarmState {
        self.state
    }

    /// Source that armed the alarm, while it remains armed.
    #[must_use]
    pub const fn armed_by(&self) -> Option<TriggerSource> {
        self.armed_by
    }

    /// Applies one input and reports the resulting transition.
    pub fn apply(&mut self, input: AlarmInput) -> Transition {
        let source = input.source();
        match (self.state, input) {
            (
                AlarmState::Disarmed,
                AlarmInput::ManualOn
                | AlarmInput::Remote(RemoteCommand::Arm)
                | AlarmInput::Presence(PresenceEvent::PowerLost),
            ) => {
                self.state = AlarmState::Armed;
                self.armed_by = Some(source);
                Transition::Armed { source }
            }
            (
                AlarmState::Armed,
                AlarmInput::ManualOff | AlarmInput::Remote(RemoteCommand::Disarm),
            ) => {
                self.state = AlarmState::Disarmed;
                self.armed_by = None;
                Transition::Disarmed { source }
            }
            (state, _) => Transition::Unchanged(state),
        }
    }
}
