//! Lock Database Persistence
//!
//! The compensator never touches the filesystem directly. It hands a
//! [`PersistedState`] snapshot to a [`LockStore`] from the host tick, and
//! reads one back when the module is enabled.
//!
//! # Backends
//!
//! - [`JsonFileStore`]: pretty JSON file, written to a temp file and renamed
//! - [`MemoryStore`]: in-process copy, for embedding hosts that own their
//!   own config persistence and for tests

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{CompensatorError, Result};
use crate::types::ActionId;

/// Everything the compensator keeps across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Learned lock per action (seconds)
    #[serde(default)]
    pub locks: BTreeMap<ActionId, f32>,
    /// Actions whose lock was shortened
    #[serde(default)]
    pub total_actions_affected: u64,
    /// Lock time removed, summed (seconds)
    #[serde(default)]
    pub total_seconds_saved: f64,
    /// When this snapshot was written (RFC 3339)
    #[serde(default)]
    pub saved_at: Option<String>,
}

impl PersistedState {
    /// Stamp the snapshot with the current time
    pub fn stamped(mut self) -> Self {
        self.saved_at = Some(Utc::now().to_rfc3339());
        self
    }
}

/// Config-store capability used by the compensator
#[cfg_attr(test, mockall::automock)]
pub trait LockStore {
    /// Read the persisted state (empty state if nothing was saved yet)
    fn load(&self) -> Result<PersistedState>;

    /// Write the state
    fn persist(&mut self, state: &PersistedState) -> Result<()>;
}

/// JSON file backend
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store writing to `path` (parent directories are created on persist)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this store writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockStore for JsonFileStore {
    fn load(&self) -> Result<PersistedState> {
        if !self.path.exists() {
            info!("No lock database at {:?}, starting empty", self.path);
            return Ok(PersistedState::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let state: PersistedState = serde_json::from_str(&content)?;
        info!(
            "Loaded {} learned locks from {:?}",
            state.locks.len(),
            self.path
        );
        Ok(state)
    }

    fn persist(&mut self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            CompensatorError::Persistence(format!(
                "Failed to move {:?} into place: {}",
                tmp, e
            ))
        })?;

        debug!("Persisted {} locks to {:?}", state.locks.len(), self.path);
        Ok(())
    }
}

/// In-memory backend
///
/// Clones share the same state, so a host (or a test) can keep one handle
/// while the compensator owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    state: PersistedState,
    persist_count: usize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `state`
    pub fn with_state(state: PersistedState) -> Self {
        let store = Self::default();
        store.inner.lock().state = state;
        store
    }

    /// Last persisted state
    pub fn state(&self) -> PersistedState {
        self.inner.lock().state.clone()
    }

    /// Number of successful persists
    pub fn persist_count(&self) -> usize {
        self.inner.lock().persist_count
    }
}

impl LockStore for MemoryStore {
    fn load(&self) -> Result<PersistedState> {
        Ok(self.inner.lock().state.clone())
    }

    fn persist(&mut self, state: &PersistedState) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.state = state.clone();
        inner.persist_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> PersistedState {
        let mut locks = BTreeMap::new();
        locks.insert(ActionId(7), 0.6);
        locks.insert(ActionId(16), 0.8);
        PersistedState {
            locks,
            total_actions_affected: 12,
            total_seconds_saved: 1.25,
            saved_at: None,
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("locks.json"));
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_file_store_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("locks.json");
        let mut store = JsonFileStore::new(&path);

        let state = sample_state().stamped();
        store.persist(&state).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locks.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn test_memory_store_shares_state() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        handle.persist(&sample_state()).unwrap();

        assert_eq!(store.persist_count(), 1);
        assert_eq!(store.state().locks.len(), 2);
    }

    #[test]
    fn test_stamped_sets_timestamp() {
        let state = PersistedState::default().stamped();
        assert!(state.saved_at.is_some());
    }
}
