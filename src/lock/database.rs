//! Learned Lock Database
//!
//! Maps each action type to the last authoritative lock the server returned
//! for it. Lookups for unseen actions fall back to the host's default lock.
//! Every prediction carries a simulated round trip on top, so a predicted
//! lock is never shorter than a realistic network response.
//!
//! Writes only mark the database dirty. The owner flushes it to the
//! [`LockStore`](crate::store::LockStore) from the host tick, once the host
//! is outside a protected state.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::LockConfig;
use crate::error::{CompensatorError, Result};
use crate::types::ActionId;

/// Per-action learned lock durations (seconds)
#[derive(Debug, Clone)]
pub struct LockDatabase {
    entries: BTreeMap<ActionId, f32>,
    default_lock: f32,
    simulated_rtt: f32,
    min_recorded: f32,
    dirty: bool,
}

impl LockDatabase {
    /// Create an empty database
    pub fn new(config: &LockConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            default_lock: config.default_lock_secs,
            simulated_rtt: config.simulated_rtt_secs,
            min_recorded: config.min_recorded_lock_secs,
            dirty: false,
        }
    }

    /// Replace contents with persisted entries
    ///
    /// Negative or non-finite values are dropped. Does not mark the database dirty.
    pub fn load_entries(&mut self, entries: BTreeMap<ActionId, f32>) {
        let before = entries.len();
        self.entries = entries
            .into_iter()
            .filter(|(_, secs)| secs.is_finite() && *secs >= 0.0)
            .collect();
        if self.entries.len() != before {
            debug!(
                "Dropped {} invalid persisted lock entries",
                before - self.entries.len()
            );
        }
        self.dirty = false;
    }

    /// Predicted lock for an action
    pub fn lookup(&self, action: ActionId) -> f32 {
        let base = match self.entries.get(&action) {
            Some(&secs) if secs >= self.min_recorded => secs,
            _ => self.default_lock,
        };
        base + self.simulated_rtt
    }

    /// Store an authoritative lock value
    ///
    /// Returns `Ok(false)` if the stored value is already identical.
    pub fn record(&mut self, action: ActionId, secs: f32) -> Result<bool> {
        let secs = CompensatorError::check_lock(secs)?;
        if self.entries.get(&action) == Some(&secs) {
            return Ok(false);
        }
        self.entries.insert(action, secs);
        self.dirty = true;
        debug!(
            "Recorded new lock value of {:.0} ms for {}",
            secs * 1000.0,
            action
        );
        Ok(true)
    }

    /// Stored value, if any
    pub fn get(&self, action: ActionId) -> Option<f32> {
        self.entries.get(&action).copied()
    }

    /// All stored entries
    pub fn entries(&self) -> &BTreeMap<ActionId, f32> {
        &self.entries
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been learned yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are changes not yet persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a persist attempt
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Lock the host applies before any prediction
    pub fn default_lock(&self) -> f32 {
        self.default_lock
    }
}

impl Default for LockDatabase {
    fn default() -> Self {
        Self::new(&LockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(default_lock: f32) -> LockConfig {
        LockConfig {
            default_lock_secs: default_lock,
            simulated_rtt_secs: 0.04,
            min_recorded_lock_secs: 0.5,
        }
    }

    #[test]
    fn test_unseen_action_uses_default_plus_rtt() {
        let db = LockDatabase::new(&config(0.6));
        let predicted = db.lookup(ActionId(42));
        assert!((predicted - 0.64).abs() < 1e-6);
        assert!(predicted > db.default_lock());
    }

    #[test]
    fn test_recorded_value_used() {
        let mut db = LockDatabase::new(&config(0.5));
        assert!(db.record(ActionId(1), 0.7).unwrap());
        assert!((db.lookup(ActionId(1)) - 0.74).abs() < 1e-6);
    }

    #[test]
    fn test_value_below_threshold_ignored() {
        let mut db = LockDatabase::new(&config(0.5));
        db.record(ActionId(1), 0.1).unwrap();
        assert_eq!(db.get(ActionId(1)), Some(0.1));
        assert!((db.lookup(ActionId(1)) - 0.54).abs() < 1e-6);
    }

    #[test]
    fn test_repeat_record_is_noop() {
        let mut db = LockDatabase::default();
        assert!(db.record(ActionId(3), 0.6).unwrap());
        assert!(db.is_dirty());
        db.mark_clean();

        assert!(!db.record(ActionId(3), 0.6).unwrap());
        assert!(!db.is_dirty());

        assert!(db.record(ActionId(3), 0.65).unwrap());
        assert!(db.is_dirty());
    }

    #[test]
    fn test_negative_record_rejected() {
        let mut db = LockDatabase::default();
        assert!(db.record(ActionId(3), -0.2).is_err());
        assert!(db.is_empty());
        assert!(!db.is_dirty());
    }

    #[test]
    fn test_load_entries_filters_invalid() {
        let mut db = LockDatabase::default();
        let mut entries = BTreeMap::new();
        entries.insert(ActionId(1), 0.6);
        entries.insert(ActionId(2), -1.0);
        entries.insert(ActionId(3), f32::NAN);
        db.load_entries(entries);

        assert_eq!(db.len(), 1);
        assert_eq!(db.get(ActionId(1)), Some(0.6));
        assert!(!db.is_dirty());
    }
}
