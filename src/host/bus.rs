//! Observer registration
//!
//! Hosts publish events to an [`EventBus`]; modules attach and detach their
//! handlers as a block.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

use super::events::{HostEvent, HostEventHandler};

/// Handler shared between the bus and its owner
pub type SharedHandler = Arc<Mutex<dyn HostEventHandler + Send>>;

/// Registration handle returned by [`EventBus::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Anything handlers can be registered with
pub trait EventBus {
    /// Register a handler for every event stream
    fn attach(&mut self, handler: SharedHandler) -> HandlerId;

    /// Remove a handler; returns false if it was not registered
    fn detach(&mut self, id: HandlerId) -> bool;
}

/// In-process bus delivering events to handlers in registration order
#[derive(Default)]
pub struct HostEventBus {
    handlers: Vec<(HandlerId, SharedHandler)>,
    next_id: u64,
}

impl HostEventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every attached handler
    pub fn publish(&self, event: &HostEvent) {
        trace!("Publishing {:?} to {} handlers", event, self.handlers.len());
        for (_, handler) in &self.handlers {
            event.dispatch(&mut *handler.lock());
        }
    }

    /// Number of attached handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl EventBus for HostEventBus {
    fn attach(&mut self, handler: SharedHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        debug!("Attached handler {:?}", id);
        id
    }

    fn detach(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(hid, _)| *hid != id);
        let removed = self.handlers.len() != before;
        if removed {
            debug!("Detached handler {:?}", id);
        }
        removed
    }
}
