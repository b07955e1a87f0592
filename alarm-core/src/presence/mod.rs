//! Debounced power presence detection.
//!
//! The detector is deliberately asymmetric: it needs `debounce_count`
//! consecutive low averages before declaring the supply lost, but a single
//! healthy average restores it. Transient sag never raises the alarm, and
//! recovery is reported as soon as the rail is back.

use core::fmt;

use crate::config::AlarmConfig;

/// Debounced view of the supply rail.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PresenceState {
    Present,
    Absent,
}

impl PresenceState {
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, PresenceState::Present)
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceState::Present => f.write_str("present"),
            PresenceState::Absent => f.write_str("absent"),
        }
    }
}

/// Transition reported by [`PresenceDetector::observe`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PresenceEvent {
    PowerLost,
    PowerRestored,
}

/// Threshold + run-length detector fed with smoothed averages.
#[derive(Clone, Debug)]
pub struct PresenceDetector {
    threshold_volts: f32,
    debounce_count: u16,
    warmup_remaining: usize,
    state: PresenceState,
    below_count: u16,
}

impl PresenceDetector {
    /// Creates a detector that starts optimistically in [`PresenceState::Present`].
    ///
    /// The first `warmup` observations are ignored entirely; pass the filter
    /// window size so the zero-seeded ramp-up cannot count towards a loss.
    #[must_use]
    pub const fn new(threshold_volts: f32, debounce_count: u16, warmup: usize) -> Self {
        Self {
            threshold_volts,
            debounce_count,
            warmup_remaining: warmup,
            state: PresenceState::Present,
            below_count: 0,
        }
    }

    /// Builds a detector using the threshold, debounce, and window from `config`.
    #[must_use]
    pub const fn from_config(config: &AlarmConfig) -> Self {
        Self::new(
            config.absent_threshold_volts(),
            config.debounce_count(),
            config.window_size(),
        )
    }

    /// Feeds one smoothed average and reports a state transition, if any.
    pub fn observe(&mut self, average: f32) -> Option<PresenceEvent> {
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return None;
        }

        if !average.is_finite() {
            return None;
        }

        if average < self.threshold_volts {
            self.below_count = self.below_count.saturating_add(1);
            if self.state == PresenceState::Present && self.below_count >= self.debounce_count {
                self.state = PresenceState::Absent;
                return Some(PresenceEvent::PowerLost);
            }
            return None;
        }

        self.below_count = 0;
        if self.state == PresenceState::Absent {
            self.state = PresenceState::Present;
            return Some(PresenceEvent::PowerRestored);
        }

        None
    }

    #[must_use]
    pub const fn state(&self) -> PresenceState {
        self.state
    }

    /// Current run of consecutive below-threshold observations.
    #[must_use]
    pub const fn below_count(&self) -> u16 {
        self.below_count
    }

    /// Returns `true` while warm-up observations are still being discarded.
    #[must_use]
    pub const fn is_warming_up(&self) -> bool {
        self.warmup_remaining > 0
    }
}
