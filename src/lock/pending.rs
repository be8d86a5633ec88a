//! Pending Lock Registry
//!
//! Remembers what was predicted for each outstanding submission so the
//! authoritative update can be matched back to it by sequence token.
//! Lookups do not remove entries; tokens are not reused while an action is
//! outstanding, so a stale entry is never read for the wrong action.

use std::collections::{HashMap, VecDeque};

use crate::types::{ActionId, SequenceToken};

/// Prediction made for one submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLock {
    /// Action that was submitted
    pub action: ActionId,
    /// Lock predicted from the database
    pub predicted: f32,
    /// Lock the live field counted down from (the prediction, or the
    /// host default when the prediction was not written)
    pub started_from: f32,
    /// Whether the prediction was written to the live field
    pub applied: bool,
    /// Outbound packets within the window at submission
    pub packets_in_window: u32,
}

/// Outstanding predictions keyed by sequence token
#[derive(Debug, Clone)]
pub struct PendingLockRegistry {
    entries: HashMap<SequenceToken, PendingLock>,
    order: VecDeque<SequenceToken>,
    capacity: usize,
}

impl PendingLockRegistry {
    /// Create a registry holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Store a prediction, replacing any previous one for the token
    pub fn reserve(&mut self, token: SequenceToken, pending: PendingLock) {
        if self.entries.insert(token, pending).is_some() {
            self.order.retain(|t| *t != token);
        }
        self.order.push_back(token);

        // Limit history size
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    /// Prediction recorded for a token
    pub fn consume(&self, token: SequenceToken) -> Option<PendingLock> {
        self.entries.get(&token).copied()
    }

    /// Remove the prediction for a token once its update has been handled
    pub fn settle(&mut self, token: SequenceToken) -> Option<PendingLock> {
        let settled = self.entries.remove(&token);
        if settled.is_some() {
            self.order.retain(|t| *t != token);
        }
        settled
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no prediction is retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for PendingLockRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}
