#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Monotonic time shared between Embassy and `alarm-core`.

use core::ops::Add;

use alarm_core::TelemetryInstant;
use embassy_time::{Duration, Instant};

/// Embassy [`Instant`] wrapped so the core crate can schedule against it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    /// Current time from the Embassy time driver.
    #[cfg(target_os = "none")]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub const fn into_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl Add<core::time::Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: core::time::Duration) -> Self::Output {
        Self(self.0 + core_duration_to_embassy(rhs))
    }
}

impl TelemetryInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> core::time::Duration {
        let micros = self
            .0
            .checked_duration_since(earlier.0)
            .map_or(0, |elapsed| elapsed.as_micros());
        core::time::Duration::from_micros(micros)
    }
}

/// Converts a core duration, saturating at the Embassy maximum.
pub fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micros(value: u64) -> FirmwareInstant {
        FirmwareInstant::from(Instant::from_micros(value))
    }

    #[test]
    fn duration_since_saturates_backwards() {
        assert_eq!(
            micros(100).saturating_duration_since(micros(400)),
            core::time::Duration::ZERO
        );
        assert_eq!(
            micros(400).saturating_duration_since(micros(100)),
            core::time::Duration::from_micros(300)
        );
    }

    #[test]
    fn adding_core_durations_advances_instant() {
        let later = micros(1_000) + core::time::Duration::from_millis(2);
        assert_eq!(later.into_embassy().as_micros(), 3_000);
    }
}
