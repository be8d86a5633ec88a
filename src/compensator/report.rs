//! Compensator status snapshot

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Point-in-time view of the compensator for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompensatorReport {
    /// Compensation switched on
    pub enabled: bool,
    /// Share of the server lock removed (0-100)
    pub removal_percentage: f32,
    /// Effective dry-run (configured or forced by anticheat)
    pub dry_run: bool,
    /// Anticheat latch
    pub anticheat_detected: bool,
    /// Local cast in progress
    pub casting: bool,
    /// Actions whose lock was shortened, all sessions
    pub total_actions_affected: u64,
    /// Lock time removed, all sessions
    pub total_time_saved: Duration,
    /// Moving average of response delay
    pub average_delay: Duration,
    /// Submissions made with other packets in the window
    pub burst_submissions: u64,
    /// Entries in the lock database
    pub learned_locks: usize,
    /// Outstanding predictions
    pub pending_predictions: usize,
    /// Outbound packets in the current window
    pub packets_in_window: u32,
}

/// Format as `d:hh:mm:ss`
pub fn format_span(span: Duration) -> String {
    let total = span.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{}:{:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

impl fmt::Display for CompensatorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reduced a total time of {} from {} actions",
            format_span(self.total_time_saved),
            self.total_actions_affected
        )?;
        if self.average_delay > Duration::ZERO {
            write!(f, ", avg response {} ms", self.average_delay.as_millis())?;
        }
        if self.dry_run {
            write!(f, " [dry run]")?;
        }
        if !self.enabled {
            write!(f, " [disabled]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> CompensatorReport {
        CompensatorReport {
            enabled: true,
            removal_percentage: 0.0,
            dry_run: false,
            anticheat_detected: false,
            casting: false,
            total_actions_affected: 1234,
            total_time_saved: Duration::from_secs(90_061),
            average_delay: Duration::ZERO,
            burst_submissions: 0,
            learned_locks: 3,
            pending_predictions: 0,
            packets_in_window: 0,
        }
    }

    #[test]
    fn test_format_span() {
        assert_eq!(format_span(Duration::from_secs(0)), "0:00:00:00");
        assert_eq!(format_span(Duration::from_secs(3_725)), "0:01:02:05");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            report().to_string(),
            "Reduced a total time of 1:01:01:01 from 1234 actions"
        );

        let mut r = report();
        r.dry_run = true;
        r.average_delay = Duration::from_millis(85);
        assert!(r.to_string().ends_with(", avg response 85 ms [dry run]"));
    }
}
