//! Single-owner control loop for the alarm.
//!
//! [`AlarmController`] owns the filter, detector, state machine, and
//! actuator. Firmware and emulator call [`AlarmController::poll`] once per
//! iteration with whatever the hardware reported, then wait for the
//! returned [`PollReport::next_wake`]. All state mutation happens inside
//! these calls, so no locking is needed even though three sources feed the
//! same alarm.
//!
//! Inputs within one poll are applied in a fixed order: button edges, then
//! the remote command, then the supply sample.

mod buttons;

use core::cmp;
use core::ops::Add;
use core::time::Duration;

use heapless::Vec;

pub use buttons::{ButtonEdges, ButtonId, ButtonInputs, ButtonLevels, EdgeDetector};

use crate::actuator::{Actuator, AlarmOutputs};
use crate::alarm::{
    AlarmInput, AlarmState, AlarmStateMachine, RemoteCommand, Transition, TriggerSource,
};
use crate::config::{AlarmConfig, ConfigError};
use crate::control::StatusView;
use crate::presence::{PresenceDetector, PresenceEvent, PresenceState};
use crate::sampling::{MovingAverage, SupplyRail, to_millivolts};
use crate::telemetry::{AlarmEventKind, AlarmPayload, TelemetryInstant, TelemetryRecorder};

/// Upper bound on inputs applied in one poll (two buttons, one command, one presence event).
pub const MAX_TRANSITIONS_PER_POLL: usize = 4;

/// Everything the hardware reported for one iteration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PollInputs {
    /// Rail voltage, or `None` when the reading failed.
    pub supply_volts: Option<f32>,
    pub buttons: ButtonLevels,
    /// At most one decoded command from the control endpoint.
    pub command: Option<RemoteCommand>,
}

impl PollInputs {
    /// Samples the rail and buttons through their capability traits.
    pub fn sample<S, B>(rail: &mut S, buttons: &mut B, command: Option<RemoteCommand>) -> Self
    where
        S: SupplyRail,
        B: ButtonInputs,
    {
        Self {
            supply_volts: rail.read_supply_voltage(),
            buttons: ButtonLevels::sample(buttons),
            command,
        }
    }
}

/// Outcome of one [`AlarmController::poll`].
#[derive(Clone, Debug, PartialEq)]
pub struct PollReport {
    /// Transitions applied this iteration, in order.
    pub transitions: Vec<Transition, MAX_TRANSITIONS_PER_POLL>,
    /// Presence change reported by the detector, if any.
    pub presence: Option<PresenceEvent>,
    /// Filter output for this iteration's sample.
    pub average_volts: Option<f32>,
    /// Alarm state after all inputs were applied.
    pub state: AlarmState,
    /// Longest the caller may wait before polling again.
    pub next_wake: Duration,
}

impl PollReport {
    /// Returns `true` when any input changed the alarm state.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.transitions.iter().any(|transition| transition.is_change())
    }
}

/// Filter, detector, state machine, and actuator wired together.
pub struct AlarmController<O, I>
where
    I: TelemetryInstant,
{
    config: AlarmConfig,
    filter: MovingAverage,
    detector: PresenceDetector,
    alarm: AlarmStateMachine,
    actuator: Actuator<O, I>,
    edges: EdgeDetector,
    telemetry: TelemetryRecorder<I>,
    last_average: Option<f32>,
    /// Set while consecutive polls have no rail reading.
    reading_failed: bool,
}

impl<O, I> AlarmController<O, I>
where
    O: AlarmOutputs,
    I: TelemetryInstant + Ord + Add<Duration, Output = I>,
{
    /// Validates `config` and builds a disarmed controller driving `outputs`.
    pub fn new(outputs: O, config: AlarmConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            filter: MovingAverage::new(config.window_size()),
            detector: PresenceDetector::from_config(&config),
            alarm: AlarmStateMachine::new(),
            actuator: Actuator::from_config(outputs, &config),
            edges: EdgeDetector::new(),
            telemetry: TelemetryRecorder::new(),
            last_average: None,
            reading_failed: false,
        })
    }

    /// Runs one control loop iteration.
    pub fn poll(&mut self, now: I, inputs: PollInputs) -> PollReport {
        let mut transitions = Vec::new();

        let edges = self.edges.update(inputs.buttons);
        if edges.alarm_on {
            self.push(&mut transitions, AlarmInput::ManualOn, now);
        }
        if edges.alarm_off {
            self.push(&mut transitions, AlarmInput::ManualOff, now);
        }

        if let Some(command) = inputs.command {
            self.push(&mut transitions, AlarmInput::Remote(command), now);
        }

        let mut presence = None;
        let mut average_volts = None;
        match inputs.supply_volts {
            Some(volts) => {
                self.reading_failed = false;
                let average = self.filter.update(volts);
                self.last_average = Some(average);
                average_volts = Some(average);

                presence = self.detector.observe(average);
                if let Some(event) = presence {
                    self.record_presence(event, average, now);
                    self.push(&mut transitions, AlarmInput::Presence(event), now);
                }
            }
            // Only the first failure of a run is recorded.
            None if self.reading_failed => {}
            None => {
                self.reading_failed = true;
                self.telemetry.record(
                    AlarmEventKind::ReadingUnavailable,
                    AlarmPayload::None,
                    now,
                );
            }
        }

        PollReport {
            transitions,
            presence,
            average_volts,
            state: self.alarm.state(),
            next_wake: self.service(now),
        }
    }

    /// Applies a remote command outside the regular poll.
    ///
    /// Lets the firmware act on a disarm the moment it arrives instead of
    /// after the current wait.
    pub fn apply_remote(&mut self, now: I, command: RemoteCommand) -> Transition {
        let transition = self.apply(AlarmInput::Remote(command), now);
        self.service(now);
        transition
    }

    /// Drives the actuator and returns how long the caller may wait.
    ///
    /// The wait never exceeds the poll interval nor the time left in the
    /// current beep phase.
    pub fn service(&mut self, now: I) -> Duration {
        let poll_interval = self.config.poll_interval();
        if self.alarm.state().is_armed() {
            cmp::min(poll_interval, self.actuator.tick(now))
        } else {
            poll_interval
        }
    }

    #[must_use]
    pub const fn state(&self) -> AlarmState {
        self.alarm.state()
    }

    #[must_use]
    pub const fn armed_by(&self) -> Option<TriggerSource> {
        self.alarm.armed_by()
    }

    #[must_use]
    pub const fn presence(&self) -> PresenceState {
        self.detector.state()
    }

    /// Most recent filter output, if any sample has been taken.
    #[must_use]
    pub const fn average_volts(&self) -> Option<f32> {
        self.last_average
    }

    #[must_use]
    pub const fn config(&self) -> &AlarmConfig {
        &self.config
    }

    pub fn actuator(&self) -> &Actuator<O, I> {
        &self.actuator
    }

    pub fn telemetry(&self) -> &TelemetryRecorder<I> {
        &self.telemetry
    }

    /// Snapshot consumed by the status page renderer.
    #[must_use]
    pub fn status_view(&self) -> StatusView {
        StatusView {
            alarm: self.alarm.state(),
            armed_by: self.alarm.armed_by(),
            presence: self.detector.state(),
            supply_millivolts: self.last_average.map(to_millivolts),
        }
    }

    fn push(
        &mut self,
        transitions: &mut Vec<Transition, MAX_TRANSITIONS_PER_POLL>,
        input: AlarmInput,
        now: I,
    ) {
        let transition = self.apply(input, now);
        // At most one input per slot reaches here, so the vector never fills.
        let _ = transitions.push(transition);
    }

    fn apply(&mut self, input: AlarmInput, now: I) -> Transition {
        let transition = self.alarm.apply(input);
        match transition {
            Transition::Armed { source } => {
                self.telemetry
                    .record(AlarmEventKind::Armed(source), AlarmPayload::None, now);
            }
            Transition::Disarmed { source } => {
                self.telemetry
                    .record(AlarmEventKind::Disarmed(source), AlarmPayload::None, now);
                if self.actuator.silence() {
                    self.telemetry
                        .record(AlarmEventKind::OutputsSilenced, AlarmPayload::None, now);
                }
            }
            Transition::Unchanged(_) => {}
        }
        transition
    }

    fn record_presence(&mut self, event: PresenceEvent, average: f32, now: I) {
        let kind = match event {
            PresenceEvent::PowerLost => AlarmEventKind::PowerLost,
            PresenceEvent::PowerRestored => AlarmEventKind::PowerRestored,
        };
        let payload = AlarmPayload::Supply {
            millivolts: to_millivolts(average),
        };
        self.telemetry.record(kind, payload, now);
    }
}
