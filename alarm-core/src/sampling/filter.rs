use crate::config::MAX_WINDOW_SIZE;

/// Fixed-window moving average over the most recent supply samples.
///
/// The window starts zero-seeded, so the first `window_size` averages are
/// biased low while the ring fills. Callers that act on the average must
/// treat that ramp-up as inconclusive; [`MovingAverage::is_primed`] reports
/// when it is over.
#[derive(Clone, Debug)]
pub struct MovingAverage {
    window: [f32; MAX_WINDOW_SIZE],
    window_size: usize,
    next: usize,
    sum: f32,
    inserted: usize,
}

impl MovingAverage {
    /// Creates a filter averaging `window_size` samples.
    ///
    /// The size is clamped to `1..=MAX_WINDOW_SIZE`; use
    /// [`AlarmConfig::validate`](crate::config::AlarmConfig::validate) to
    /// reject bad sizes up front.
    #[must_use]
    pub const fn new(window_size: usize) -> Self {
        let window_size = if window_size == 0 {
            1
        } else if window_size > MAX_WINDOW_SIZE {
            MAX_WINDOW_SIZE
        } else {
            window_size
        };

        Self {
            window: [0.0; MAX_WINDOW_SIZE],
            window_size,
            next: 0,
            sum: 0.0,
            inserted: 0,
        }
    }

    /// Inserts `sample`, evicting the oldest value, and returns the new average.
    pub fn update(&mut self, sample: f32) -> f32 {
        let evicted = self.window[self.next];
        self.window[self.next] = sample;
        self.sum += sample - evicted;

        self.next += 1;
        if self.next == self.window_size {
            self.next = 0;
            // Re-derive once per wrap so rounding error cannot pile up.
            self.sum = self.held().iter().sum();
        }

        self.inserted = self.inserted.saturating_add(1);
        self.average()
    }

    /// Returns the current average over the whole window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f32 {
        self.sum / self.window_size as f32
    }

    /// Returns `true` once every slot holds a real sample.
    #[must_use]
    pub const fn is_primed(&self) -> bool {
        self.inserted >= self.window_size
    }

    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Clears the window back to its zero-seeded state.
    pub fn reset(&mut self) {
        *self = Self::new(self.window_size);
    }

    fn held(&self) -> &[f32] {
        &self.window[..self.window_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        let delta = a - b;
        delta < 1e-4 && delta > -1e-4
    }

    #[test]
    fn ramp_up_is_zero_seeded() {
        let mut filter = MovingAverage::new(4);
        assert!(close(filter.update(4.0), 1.0));
        assert!(close(filter.update(4.0), 2.0));
        assert!(!filter.is_primed());
        assert!(close(filter.update(4.0), 3.0));
        assert!(close(filter.update(4.0), 4.0));
        assert!(filter.is_primed());
    }

    #[test]
    fn average_tracks_most_recent_window() {
        let mut filter = MovingAverage::new(3);
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 9.0, 0.5];
        let mut averages = [0.0_f32; 7];
        for (slot, sample) in averages.iter_mut().zip(samples) {
            *slot = filter.update(sample);
        }

        assert!(close(averages[2], 2.0));
        assert!(close(averages[3], 3.0));
        assert!(close(averages[4], 4.0));
        assert!(close(averages[5], 6.0));
        assert!(close(averages[6], 14.5 / 3.0));
    }

    #[test]
    fn long_runs_do_not_drift() {
        let mut filter = MovingAverage::new(10);
        for index in 0..10_000_u32 {
            let sample = if index % 2 == 0 { 5.1 } else { 4.9 };
            filter.update(sample);
        }
        assert!(close(filter.average(), 5.0));
    }

    #[test]
    fn size_is_clamped_and_reset_restores_seed() {
        let mut filter = MovingAverage::new(0);
        assert_eq!(filter.window_size(), 1);
        assert!(close(filter.update(3.3), 3.3));

        filter.reset();
        assert!(!filter.is_primed());
        assert!(close(filter.average(), 0.0));

        assert_eq!(MovingAverage::new(1_000).window_size(), MAX_WINDOW_SIZE);
    }
}
