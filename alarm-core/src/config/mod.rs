//! Tunable constants for the alarm decision engine.
//!
//! [`AlarmConfig`] bundles the filter window, detection threshold, debounce
//! run-length, beep cadence, and polling period. The defaults reproduce the
//! reference board: a ten-sample window, a 4.7 V cutoff on a nominal 5 V
//! rail, 500 ms beeps separated by 200 ms of silence, and a 100 ms poll.

use core::fmt;
use core::time::Duration;

/// Largest filter window the fixed-capacity ring can hold.
pub const MAX_WINDOW_SIZE: usize = 32;
/// Number of samples averaged by the reference configuration.
pub const DEFAULT_WINDOW_SIZE: usize = 10;
/// Smoothed supply voltage below which the rail counts as absent.
pub const DEFAULT_ABSENT_THRESHOLD_VOLTS: f32 = 4.7;
/// Consecutive low averages required before declaring power lost.
pub const DEFAULT_DEBOUNCE_COUNT: u16 = 10;
/// Duration of the audible part of the alarm cycle.
pub const DEFAULT_BEEP_ON: Duration = Duration::from_millis(500);
/// Duration of the silent part of the alarm cycle.
pub const DEFAULT_BEEP_OFF: Duration = Duration::from_millis(200);
/// Period between control loop iterations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration shared by the filter, detector, actuator, and control loop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlarmConfig {
    window_size: usize,
    absent_threshold_volts: f32,
    debounce_count: u16,
    beep_on: Duration,
    beep_off: Duration,
    poll_interval: Duration,
}

impl AlarmConfig {
    /// Creates the reference configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            absent_threshold_volts: DEFAULT_ABSENT_THRESHOLD_VOLTS,
            debounce_count: DEFAULT_DEBOUNCE_COUNT,
            beep_on: DEFAULT_BEEP_ON,
            beep_off: DEFAULT_BEEP_OFF,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the number of samples averaged by the filter.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Overrides the detection cutoff.
    #[must_use]
    pub const fn with_absent_threshold_volts(mut self, volts: f32) -> Self {
        self.absent_threshold_volts = volts;
        self
    }

    /// Overrides the debounce run-length.
    #[must_use]
    pub const fn with_debounce_count(mut self, count: u16) -> Self {
        self.debounce_count = count;
        self
    }

    /// Overrides the beep and silence phase durations.
    #[must_use]
    pub const fn with_beep_pattern(mut self, on: Duration, off: Duration) -> Self {
        self.beep_on = on;
        self.beep_off = off;
        self
    }

    /// Overrides the control loop period.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    #[must_use]
    pub const fn absent_threshold_volts(&self) -> f32 {
        self.absent_threshold_volts
    }

    #[must_use]
    pub const fn debounce_count(&self) -> u16 {
        self.debounce_count
    }

    #[must_use]
    pub const fn beep_on(&self) -> Duration {
        self.beep_on
    }

    #[must_use]
    pub const fn beep_off(&self) -> Duration {
        self.beep_off
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Worst-case delay between a disarm request and silenced outputs.
    ///
    /// The control loop never waits longer than the shorter beep phase, so
    /// this is also the bound [`AlarmConfig::validate`] enforces on the poll
    /// interval.
    #[must_use]
    pub const fn disarm_latency_bound(&self) -> Duration {
        if self.beep_on.as_nanos() < self.beep_off.as_nanos() {
            self.beep_on
        } else {
            self.beep_off
        }
    }

    /// Checks the configuration for values the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(ConfigError::WindowSize(self.window_size));
        }

        if !self.absent_threshold_volts.is_finite() || self.absent_threshold_volts <= 0.0 {
            return Err(ConfigError::Threshold);
        }

        if self.debounce_count == 0 {
            return Err(ConfigError::DebounceCount);
        }

        if self.beep_on.is_zero() || self.beep_off.is_zero() {
            return Err(ConfigError::BeepPhase);
        }

        if self.poll_interval.is_zero() || self.poll_interval > self.disarm_latency_bound() {
            return Err(ConfigError::PollInterval {
                interval: self.poll_interval,
                bound: self.disarm_latency_bound(),
            });
        }

        Ok(())
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasons an [`AlarmConfig`] is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Window is empty or larger than [`MAX_WINDOW_SIZE`].
    WindowSize(usize),
    /// Threshold is not a positive, finite voltage.
    Threshold,
    /// Debounce count of zero would report loss on the first low sample.
    DebounceCount,
    /// A beep or silence phase has zero length.
    BeepPhase,
    /// Poll interval is zero or exceeds the disarm latency bound.
    PollInterval { interval: Duration, bound: Duration },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WindowSize(size) => {
                write!(f, "window size {size} outside 1-{MAX_WINDOW_SIZE}")
            }
            ConfigError::Threshold => f.write_str("absent threshold must be a positive voltage"),
            ConfigError::DebounceCount => f.write_str("debounce count must be at least 1"),
            ConfigError::BeepPhase => f.write_str("beep phases must be non-zero"),
            ConfigError::PollInterval { interval, bound } => write!(
                f,
                "poll interval {} ms must be between 1 ms and {} ms",
                interval.as_millis(),
                bound.as_millis()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_configuration_is_valid() {
        let config = AlarmConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.window_size(), 10);
        assert_eq!(config.debounce_count(), 10);
        assert_eq!(config.disarm_latency_bound(), Duration::from_millis(200));
    }

    #[test]
    fn rejects_oversized_window() {
        let config = AlarmConfig::new().with_window_size(MAX_WINDOW_SIZE + 1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::WindowSize(MAX_WINDOW_SIZE + 1))
        );
    }

    #[test]
    fn rejects_nan_threshold() {
        let config = AlarmConfig::new().with_absent_threshold_volts(f32::NAN);
        assert_eq!(config.validate(), Err(ConfigError::Threshold));
    }

    #[test]
    fn rejects_poll_interval_longer_than_shortest_phase() {
        let config = AlarmConfig::new().with_poll_interval(Duration::from_millis(250));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PollInterval { .. })
        ));
    }

    #[test]
    fn rejects_zero_phase() {
        let config =
            AlarmConfig::new().with_beep_pattern(Duration::ZERO, Duration::from_millis(200));
        assert_eq!(config.validate(), Err(ConfigError::BeepPhase));
    }
}
