//! Host interface
//!
//! Everything the compensator needs from the host process, expressed as
//! narrow capabilities so the core never reaches into host internals:
//!
//! | Capability | Purpose |
//! |------------|---------|
//! | [`LockField`] | Read/write the live action recovery lock |
//! | [`HostState`] | Local actor identity, protected (combat) state |
//! | [`HostEventHandler`] | The event streams the host fires |
//! | [`EventBus`] | Attach/detach handlers as a block |
//!
//! # Threading
//!
//! The host is expected to call handlers sequentially from its update loop.
//! Hosts with callback threads either lock a shared handler (see
//! [`CompensatorModule`](crate::compensator::CompensatorModule)) or push into
//! an [`EventQueue`] drained on the owning thread.

mod bus;
mod events;
mod queue;

pub use bus::{EventBus, HandlerId, HostEventBus, SharedHandler};
pub use events::{HostEvent, HostEventHandler, LockUpdate};
pub use queue::{EventQueue, EventSender};

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::Result;
use crate::types::ActorId;

/// Accessor for the host's live action recovery lock (seconds)
///
/// The only point where the compensator mutates host state.
#[cfg_attr(test, mockall::automock)]
pub trait LockField {
    /// Current live lock
    fn read(&self) -> f32;

    /// Overwrite the live lock
    fn write(&mut self, secs: f32) -> Result<()>;
}

/// Read-only view of host session state
#[cfg_attr(test, mockall::automock)]
pub trait HostState {
    /// Locally controlled actor, if one is loaded
    fn local_actor(&self) -> Option<ActorId>;

    /// Whether blocking I/O should be avoided right now (e.g. in combat)
    fn in_protected_state(&self) -> bool;
}

/// Lock field backed by shared memory, for hosts without a native accessor
#[derive(Debug, Clone, Default)]
pub struct SharedLockField {
    value: Arc<Mutex<f32>>,
}

impl SharedLockField {
    /// Create a field holding `secs`
    pub fn new(secs: f32) -> Self {
        Self {
            value: Arc::new(Mutex::new(secs)),
        }
    }

    /// Host-side write that bypasses the compensator
    pub fn set(&self, secs: f32) {
        *self.value.lock() = secs;
    }

    /// Current value
    pub fn get(&self) -> f32 {
        *self.value.lock()
    }
}

impl LockField for SharedLockField {
    fn read(&self) -> f32 {
        self.get()
    }

    fn write(&mut self, secs: f32) -> Result<()> {
        self.set(secs);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HostFlags {
    local_actor: Option<ActorId>,
    protected: bool,
}

/// Host state shared between the host and the compensator
#[derive(Debug, Clone, Default)]
pub struct SharedHostState {
    flags: Arc<RwLock<HostFlags>>,
}

impl SharedHostState {
    /// Create state with a loaded local actor
    pub fn with_local_actor(actor: ActorId) -> Self {
        let state = Self::default();
        state.set_local_actor(Some(actor));
        state
    }

    /// Set or clear the local actor
    pub fn set_local_actor(&self, actor: Option<ActorId>) {
        self.flags.write().local_actor = actor;
    }

    /// Enter or leave the protected state
    pub fn set_protected(&self, protected: bool) {
        self.flags.write().protected = protected;
    }
}

impl HostState for SharedHostState {
    fn local_actor(&self) -> Option<ActorId> {
        self.flags.read().local_actor
    }

    fn in_protected_state(&self) -> bool {
        self.flags.read().protected
    }
}
