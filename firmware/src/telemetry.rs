//! Console mirrors of controller activity.
//!
//! The controller keeps its own telemetry ring; these helpers echo the
//! interesting parts of each [`PollReport`] to defmt (or stdout on host
//! builds) so bring-up does not need a debugger attached to read the ring.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use alarm_core::alarm::Transition;
use alarm_core::control::{ControlRequest, RequestError};
use alarm_core::{PollReport, PresenceEvent, TriggerSource};

use crate::clock::FirmwareInstant;

/// Logs every state change and presence event carried by `report`.
pub fn log_report(report: &PollReport, timestamp: FirmwareInstant) {
    if let Some(event) = report.presence {
        let millivolts = report
            .average_volts
            .map_or(0, alarm_core::sampling::to_millivolts);
        emit_presence(presence_label(event), millivolts, micros(timestamp));
    }

    for transition in &report.transitions {
        log_transition(*transition, timestamp);
    }
}

/// Logs a transition if it changed the alarm state.
pub fn log_transition(transition: Transition, timestamp: FirmwareInstant) {
    if let Some((state, source)) = transition_labels(transition) {
        emit_transition(state, source, micros(timestamp));
    }
}

/// Logs the outcome of decoding one HTTP request.
pub fn log_request(outcome: Result<ControlRequest, RequestError>) {
    match outcome {
        Ok(request) => emit_request(request_label(request)),
        Err(error) => emit_request_error(error.status().0),
    }
}

fn micros(timestamp: FirmwareInstant) -> u64 {
    timestamp.into_embassy().as_micros()
}

const fn presence_label(event: PresenceEvent) -> &'static str {
    match event {
        PresenceEvent::PowerLost => "power-lost",
        PresenceEvent::PowerRestored => "power-restored",
    }
}

const fn source_label(source: TriggerSource) -> &'static str {
    match source {
        TriggerSource::Button => "button",
        TriggerSource::Remote => "remote",
        TriggerSource::PowerMonitor => "power-monitor",
    }
}

const fn transition_labels(transition: Transition) -> Option<(&'static str, &'static str)> {
    match transition {
        Transition::Armed { source } => Some(("armed", source_label(source))),
        Transition::Disarmed { source } => Some(("disarmed", source_label(source))),
        Transition::Unchanged(_) => None,
    }
}

const fn request_label(request: ControlRequest) -> &'static str {
    match request {
        ControlRequest::Arm => "arm",
        ControlRequest::Disarm => "disarm",
        ControlRequest::Status => "status",
    }
}

#[cfg(target_os = "none")]
fn emit_presence(event: &'static str, millivolts: u16, timestamp_us: u64) {
    defmt::warn!(
        "telemetry:supply {} avg={=u16}mV t={}us",
        event,
        millivolts,
        timestamp_us
    );
}

#[cfg(not(target_os = "none"))]
fn emit_presence(event: &'static str, millivolts: u16, timestamp_us: u64) {
    println!("telemetry:supply {event} avg={millivolts}mV t={timestamp_us}us");
}

#[cfg(target_os = "none")]
fn emit_transition(state: &'static str, source: &'static str, timestamp_us: u64) {
    defmt::info!("telemetry:alarm {} by {} t={}us", state, source, timestamp_us);
}

#[cfg(not(target_os = "none"))]
fn emit_transition(state: &'static str, source: &'static str, timestamp_us: u64) {
    println!("telemetry:alarm {state} by {source} t={timestamp_us}us");
}

#[cfg(target_os = "none")]
fn emit_request(request: &'static str) {
    defmt::info!("http: {} request", request);
}

#[cfg(not(target_os = "none"))]
fn emit_request(request: &'static str) {
    println!("http: {request} request");
}

#[cfg(target_os = "none")]
fn emit_request_error(code: u16) {
    defmt::warn!("http: rejected request ({=u16})", code);
}

#[cfg(not(target_os = "none"))]
fn emit_request_error(code: u16) {
    println!("http: rejected request ({code})");
}
