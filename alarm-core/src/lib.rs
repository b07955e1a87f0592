#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Shared logic for the power-loss alarm.
//
// Everything that decides whether the alarm should sound lives here so the
// firmware and the host emulator run the exact same code paths. The crate
// stays `no_std` and allocation-free; hardware is reached through the small
// capability traits re-exported below.

pub mod actuator;
pub mod alarm;
pub mod config;
pub mod control;
pub mod controller;
pub mod presence;
pub mod sampling;
pub mod telemetry;

pub use actuator::{Actuator, AlarmOutputs, BuzzerChannel};
pub use alarm::{AlarmInput, AlarmState, AlarmStateMachine, RemoteCommand, TriggerSource};
pub use config::{AlarmConfig, ConfigError};
pub use controller::{AlarmController, ButtonId, ButtonInputs, PollInputs, PollReport};
pub use presence::{PresenceDetector, PresenceEvent, PresenceState};
pub use sampling::{AdcScaling, MovingAverage, SupplyRail};
pub use telemetry::TelemetryInstant;
