//! Host-facing module lifecycle
//!
//! Wraps a [`LatencyCompensator`] so it can be registered with a host
//! [`EventBus`]. Attaching loads persisted state before any handler runs;
//! detaching unregisters every handler and then writes state back.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::host::{EventBus, HandlerId};

use super::engine::LatencyCompensator;
use super::report::CompensatorReport;

/// Compensator registered with a host event bus
pub struct CompensatorModule {
    inner: Arc<Mutex<LatencyCompensator>>,
    registration: Option<HandlerId>,
}

impl CompensatorModule {
    /// Wrap a compensator; nothing is attached yet
    pub fn new(compensator: LatencyCompensator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(compensator)),
            registration: None,
        }
    }

    /// Load state and register for host events
    ///
    /// A store that cannot be read leaves the database empty; the module
    /// still attaches. Attaching twice is a no-op.
    pub fn attach(&mut self, bus: &mut impl EventBus) -> HandlerId {
        if let Some(id) = self.registration {
            return id;
        }

        if let Err(e) = self.inner.lock().load() {
            warn!("Failed to load lock database, starting empty: {}", e);
        }

        let id = bus.attach(self.inner.clone());
        self.registration = Some(id);
        info!("Lock compensator attached");
        id
    }

    /// Unregister from host events and persist state
    pub fn detach(&mut self, bus: &mut impl EventBus) {
        let Some(id) = self.registration.take() else {
            return;
        };

        bus.detach(id);

        let mut compensator = self.inner.lock();
        compensator.abandon_pending();
        match compensator.save() {
            Ok(()) => info!("Lock compensator detached, {}", compensator.report()),
            Err(e) => warn!("Failed to save lock database on detach: {}", e),
        }
    }

    /// Whether the module is registered with a bus
    pub fn is_attached(&self) -> bool {
        self.registration.is_some()
    }

    /// Shared handle to the compensator
    pub fn handle(&self) -> Arc<Mutex<LatencyCompensator>> {
        self.inner.clone()
    }

    /// Run a closure with exclusive access to the compensator
    pub fn with<R>(&self, f: impl FnOnce(&mut LatencyCompensator) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Current status
    pub fn report(&self) -> CompensatorReport {
        self.inner.lock().report()
    }
}
