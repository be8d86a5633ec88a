//! Statistics Accumulator
//!
//! Reporting-only numbers. Nothing in here feeds back into prediction.
//!
//! The delay estimate is an exponential moving average so recent responses
//! dominate:
//!
//! ```text
//! avg = raw                          if avg <= 0
//! avg = avg * (1 - w) + raw * w      otherwise
//! ```

use std::time::Duration;

/// Running delay estimate and cumulative savings counters
#[derive(Debug, Clone)]
pub struct StatisticsAccumulator {
    weight: f32,
    delay_avg: f32,
    actions_affected: u64,
    seconds_saved: f64,
    burst_submissions: u64,
    dirty: bool,
}

impl StatisticsAccumulator {
    /// Create an accumulator; `weight` is clamped to (0, 1]
    pub fn new(weight: f32) -> Self {
        Self {
            weight: weight.clamp(f32::EPSILON, 1.0),
            delay_avg: 0.0,
            actions_affected: 0,
            seconds_saved: 0.0,
            burst_submissions: 0,
            dirty: false,
        }
    }

    /// Restore persisted counters
    ///
    /// A saved total that is not finite, negative, or beyond what a
    /// [`Duration`] can hold is clamped into range.
    pub fn restore(&mut self, actions_affected: u64, seconds_saved: f64) {
        self.actions_affected = actions_affected;
        self.seconds_saved = if seconds_saved.is_finite() {
            seconds_saved.clamp(0.0, Duration::MAX.as_secs_f64())
        } else if seconds_saved > 0.0 {
            Duration::MAX.as_secs_f64()
        } else {
            0.0
        };
        self.dirty = false;
    }

    /// Fold one observed response delay (seconds) into the average
    pub fn observe(&mut self, raw_delay: f32) -> f32 {
        self.delay_avg = if self.delay_avg > 0.0 {
            self.delay_avg * (1.0 - self.weight) + raw_delay * self.weight
        } else {
            raw_delay
        };
        self.delay_avg
    }

    /// Count one affected action and the lock time removed from it
    pub fn record_savings(&mut self, seconds: f32) {
        self.actions_affected = self.actions_affected.saturating_add(1);
        self.seconds_saved += f64::from(seconds.max(0.0));
        self.dirty = true;
    }

    /// Count a submission made while other packets were in flight
    pub fn record_burst(&mut self) {
        self.burst_submissions += 1;
    }

    /// Current delay estimate (seconds, 0 until the first observation)
    pub fn average_delay(&self) -> f32 {
        self.delay_avg
    }

    /// Actions whose lock was shortened
    pub fn actions_affected(&self) -> u64 {
        self.actions_affected
    }

    /// Lock time removed, summed (seconds)
    pub fn seconds_saved(&self) -> f64 {
        self.seconds_saved
    }

    /// Lock time removed, summed
    pub fn time_saved(&self) -> Duration {
        Duration::try_from_secs_f64(self.seconds_saved).unwrap_or(Duration::MAX)
    }

    /// Submissions that shared their packet window with other traffic
    pub fn burst_submissions(&self) -> u64 {
        self.burst_submissions
    }

    /// Whether the persisted counters are behind
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a persist attempt
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Default for StatisticsAccumulator {
    fn default() -> Self {
        Self::new(0.1)
    }
}
