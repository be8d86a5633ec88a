//! Outbound Packet Window
//!
//! Rolling histogram of packets sent to the server over the last
//! `bucket_count * bucket_width` (50 ms by default, five 10 ms buckets).
//!
//! The server appears to process at most one client packet per tick, so a
//! submission that shares its window with other outbound packets tends to see
//! a larger response delay. The window sum taken at submission time is kept
//! with the pending prediction to flag those cases.
//!
//! # Algorithm
//!
//! ```text
//! on_outbound_packet: buckets[index] += 1
//! tick(dt):           elapsed += dt
//!                     steps = elapsed / width, elapsed %= width
//!                     repeat min(steps, len) times:
//!                         index = (index + 1) % len
//!                         buckets[index] = 0
//! ```
//!
//! After `len` rotations every bucket is zero, so a long stall costs no more
//! than one full lap.
//!
//! Elapsed time is accumulated as a [`Duration`] so many small frame deltas
//! add up to exact bucket boundaries.

use std::time::Duration;
use tracing::trace;

use crate::config::PacketWindowConfig;

/// Sliding window of outbound packet counts
#[derive(Debug, Clone)]
pub struct PacketWindowTracker {
    buckets: Vec<u32>,
    index: usize,
    bucket_width: Duration,
    elapsed: Duration,
}

impl PacketWindowTracker {
    /// Create a tracker with the given bucket layout
    pub fn new(config: &PacketWindowConfig) -> Self {
        Self {
            buckets: vec![0; config.bucket_count.max(1)],
            index: 0,
            bucket_width: Duration::from_millis(config.bucket_ms.max(1)),
            elapsed: Duration::ZERO,
        }
    }

    /// Count one packet sent to the server
    pub fn on_outbound_packet(&mut self) {
        self.buckets[self.index] = self.buckets[self.index].saturating_add(1);
    }

    /// Advance the window by one host frame
    pub fn tick(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
        if self.elapsed >= self.bucket_width {
            let width = self.bucket_width.as_nanos();
            let steps = self.elapsed.as_nanos() / width;
            // Remainder is below one bucket width, which fits in u64 nanos
            self.elapsed = Duration::from_nanos((self.elapsed.as_nanos() % width) as u64);

            let rotations = steps.min(self.buckets.len() as u128) as usize;
            for _ in 0..rotations {
                self.index = (self.index + 1) % self.buckets.len();
                self.buckets[self.index] = 0;
            }
        }
        trace!(
            "Packet window: index={}, sum={}",
            self.index,
            self.current_window_sum()
        );
    }

    /// Packets sent within the window
    pub fn current_window_sum(&self) -> u32 {
        self.buckets.iter().sum()
    }

    /// Total time span covered by the window
    pub fn window(&self) -> Duration {
        self.bucket_width * self.buckets.len() as u32
    }

    /// Clear all buckets
    pub fn reset(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = 0);
        self.index = 0;
        self.elapsed = Duration::ZERO;
    }
}

impl Default for PacketWindowTracker {
    fn default() -> Self {
        Self::new(&PacketWindowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEN_MS: Duration = Duration::from_millis(10);

    #[test]
    fn test_default_window_is_50ms() {
        let tracker = PacketWindowTracker::default();
        assert_eq!(tracker.window(), Duration::from_millis(50));
        assert_eq!(tracker.current_window_sum(), 0);
    }

    #[test]
    fn test_sliding_sum_fills_and_decays() {
        let mut tracker = PacketWindowTracker::default();

        // One packet per 10 ms slice
        for i in 0..5 {
            tracker.on_outbound_packet();
            if i < 4 {
                tracker.tick(TEN_MS);
            }
        }
        assert_eq!(tracker.current_window_sum(), 5);

        // Each rotation drops exactly one slice
        for expected in (0..5).rev() {
            tracker.tick(TEN_MS);
            assert_eq!(tracker.current_window_sum(), expected);
        }
    }

    #[test]
    fn test_small_deltas_accumulate() {
        let mut tracker = PacketWindowTracker::default();
        tracker.on_outbound_packet();

        // Ten 1 ms frames make one bucket rotation, nothing dropped yet
        for _ in 0..10 {
            tracker.tick(Duration::from_millis(1));
        }
        assert_eq!(tracker.current_window_sum(), 1);

        // Forty more ms wrap back onto the first bucket and clear it
        for _ in 0..40 {
            tracker.tick(Duration::from_millis(1));
        }
        assert_eq!(tracker.current_window_sum(), 0);
    }

    #[test]
    fn test_long_frame_clears_everything() {
        let mut tracker = PacketWindowTracker::default();
        for _ in 0..3 {
            tracker.on_outbound_packet();
        }
        tracker.tick(Duration::from_millis(250));
        assert_eq!(tracker.current_window_sum(), 0);
    }

    #[test]
    fn test_huge_delta_does_not_overflow() {
        let mut tracker = PacketWindowTracker::default();
        tracker.tick(Duration::from_millis(7));
        tracker.on_outbound_packet();

        tracker.tick(Duration::MAX);
        assert_eq!(tracker.current_window_sum(), 0);
        tracker.tick(Duration::MAX);

        // Still rotates normally afterwards
        tracker.on_outbound_packet();
        assert_eq!(tracker.current_window_sum(), 1);
        for _ in 0..5 {
            tracker.tick(TEN_MS);
        }
        assert_eq!(tracker.current_window_sum(), 0);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut tracker = PacketWindowTracker::default();
        tracker.on_outbound_packet();
        tracker.tick(Duration::from_millis(25));
        tracker.on_outbound_packet();

        tracker.reset();
        assert_eq!(tracker.current_window_sum(), 0);
        tracker.on_outbound_packet();
        tracker.tick(Duration::from_millis(9));
        assert_eq!(tracker.current_window_sum(), 1);
    }

    proptest! {
        #[test]
        fn prop_sum_never_exceeds_packets_sent(
            steps in proptest::collection::vec((0u32..4, 0u64..25), 1..64)
        ) {
            let mut tracker = PacketWindowTracker::default();
            let mut sent = 0u32;
            for (packets, ms) in steps {
                for _ in 0..packets {
                    tracker.on_outbound_packet();
                }
                sent += packets;
                tracker.tick(Duration::from_millis(ms));
                prop_assert!(tracker.current_window_sum() <= sent);
            }
        }

        #[test]
        fn prop_quiet_window_drains(packets in 0u32..50) {
            let mut tracker = PacketWindowTracker::default();
            for _ in 0..packets {
                tracker.on_outbound_packet();
            }
            for _ in 0..5 {
                tracker.tick(TEN_MS);
            }
            prop_assert_eq!(tracker.current_window_sum(), 0);
        }
    }
}
