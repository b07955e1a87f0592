#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The control task publishes a [`StatusView`] after every iteration and the
//! HTTP task reads it back when rendering the status page, so the page
//! never touches the controller itself.

use alarm_core::control::StatusView;
use alarm_core::{AlarmState, PresenceState, TriggerSource};
use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

const UNKNOWN_SUPPLY: u32 = 0;
const NO_SOURCE: u8 = 0;

/// Set while the alarm is armed.
static ARMED: AtomicBool = AtomicBool::new(false);
/// Source that armed the alarm (0 == none).
static ARMED_BY: AtomicU8 = AtomicU8::new(NO_SOURCE);
/// Cleared once the detector declares USB power absent.
static POWER_PRESENT: AtomicBool = AtomicBool::new(true);
/// Smoothed supply in millivolts, offset by one (0 == unknown).
static SUPPLY_MV: AtomicU32 = AtomicU32::new(UNKNOWN_SUPPLY);

const fn encode_source(source: Option<TriggerSource>) -> u8 {
    match source {
        None => NO_SOURCE,
        Some(TriggerSource::Button) => 1,
        Some(TriggerSource::Remote) => 2,
        Some(TriggerSource::PowerMonitor) => 3,
    }
}

const fn decode_source(raw: u8) -> Option<TriggerSource> {
    match raw {
        1 => Some(TriggerSource::Button),
        2 => Some(TriggerSource::Remote),
        3 => Some(TriggerSource::PowerMonitor),
        _ => None,
    }
}

/// Stores the latest controller snapshot.
pub fn publish(view: &StatusView) {
    ARMED.store(view.alarm.is_armed(), Ordering::Relaxed);
    ARMED_BY.store(encode_source(view.armed_by), Ordering::Relaxed);
    POWER_PRESENT.store(view.presence.is_present(), Ordering::Relaxed);
    let supply = view
        .supply_millivolts
        .map_or(UNKNOWN_SUPPLY, |millivolts| u32::from(millivolts) + 1);
    SUPPLY_MV.store(supply, Ordering::Relaxed);
}

/// Rebuilds a [`StatusView`] from the stored fields.
pub fn snapshot() -> StatusView {
    let alarm = if ARMED.load(Ordering::Relaxed) {
        AlarmState::Armed
    } else {
        AlarmState::Disarmed
    };
    let presence = if POWER_PRESENT.load(Ordering::Relaxed) {
        PresenceState::Present
    } else {
        PresenceState::Absent
    };
    let supply_millivolts = match SUPPLY_MV.load(Ordering::Relaxed) {
        UNKNOWN_SUPPLY => None,
        raw => u16::try_from(raw - 1).ok(),
    };

    StatusView {
        alarm,
        armed_by: decode_source(ARMED_BY.load(Ordering::Relaxed)),
        presence,
        supply_millivolts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_published_view() {
        let view = StatusView {
            alarm: AlarmState::Armed,
            armed_by: Some(TriggerSource::PowerMonitor),
            presence: PresenceState::Absent,
            supply_millivolts: Some(0),
        };
        publish(&view);
        assert_eq!(snapshot(), view);

        publish(&StatusView::initial());
        assert_eq!(snapshot(), StatusView::initial());
    }

    #[test]
    fn unknown_source_codes_decode_to_none() {
        for source in [
            TriggerSource::Button,
            TriggerSource::Remote,
            TriggerSource::PowerMonitor,
        ] {
            assert_eq!(decode_source(encode_source(Some(source))), Some(source));
        }
        assert_eq!(decode_source(0xFF), None);
    }
}
