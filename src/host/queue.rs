//! Single-consumer event queue
//!
//! For hosts that fire callbacks from several threads. Producers push through
//! cloneable [`EventSender`]s; the thread that owns the compensator drains the
//! queue once per frame, so handlers still run on one timeline.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use tracing::warn;

use super::bus::HostEventBus;
use super::events::{HostEvent, HostEventHandler};

/// Producer side of an [`EventQueue`]
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<HostEvent>,
}

impl EventSender {
    /// Queue an event; returns false once the queue has been dropped
    pub fn send(&self, event: HostEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer side, owned by the compensator's timeline
pub struct EventQueue {
    tx: Sender<HostEvent>,
    rx: Receiver<HostEvent>,
}

impl EventQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Producer handle for a host callback thread
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Events waiting to be drained
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are waiting
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Deliver every queued event to a handler, in arrival order
    pub fn drain_into(&self, handler: &mut dyn HostEventHandler) -> usize {
        self.drain_with(|event| event.dispatch(&mut *handler))
    }

    /// Publish every queued event on a bus, in arrival order
    pub fn drain_to_bus(&self, bus: &HostEventBus) -> usize {
        self.drain_with(|event| bus.publish(&event))
    }

    fn drain_with(&self, mut deliver: impl FnMut(HostEvent)) -> usize {
        let mut drained = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    deliver(event);
                    drained += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Event queue disconnected");
                    break;
                }
            }
        }
        drained
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
