//! Host event streams
//!
//! The five streams the host feeds into the compensator, as a trait for
//! direct calls and as an enum for queues, buses, and replay traces.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{ActionId, ActorId, NetworkDirection, SequenceToken};

/// Authoritative lock update received from the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockUpdate {
    /// Actor the action effect belongs to
    pub source: ActorId,
    /// Token of the submission this answers
    pub sequence: SequenceToken,
    /// Action the server resolved
    pub action: ActionId,
    /// Live lock before the host applied the update (seconds)
    pub old_lock: f32,
    /// Lock the server assigned (seconds)
    pub new_lock: f32,
}

/// One host event
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Local action submission
    ActionSubmitted {
        /// Action type
        action: ActionId,
        /// Correlation token issued by the host
        sequence: SequenceToken,
    },
    /// Local cast started
    CastBegin,
    /// Local cast interrupted
    CastInterrupt,
    /// Server lock update applied by the host
    AuthoritativeLockChanged(LockUpdate),
    /// Network message seen by the host
    NetworkMessage(NetworkDirection),
    /// Host frame
    Tick(Duration),
}

impl HostEvent {
    /// Deliver this event to a handler
    pub fn dispatch(&self, handler: &mut dyn HostEventHandler) {
        match self {
            Self::ActionSubmitted { action, sequence } => {
                handler.on_action_submitted(*action, *sequence)
            }
            Self::CastBegin => handler.on_cast_begin(),
            Self::CastInterrupt => handler.on_cast_interrupt(),
            Self::AuthoritativeLockChanged(update) => handler.on_authoritative_lock_changed(update),
            Self::NetworkMessage(direction) => handler.on_network_message(*direction),
            Self::Tick(delta) => handler.on_tick(*delta),
        }
    }
}

/// Receiver of host events
///
/// Handlers must not fail: anything that goes wrong is logged and swallowed
/// so the host's own loop is never disturbed.
pub trait HostEventHandler {
    /// Fired once per local action submission
    fn on_action_submitted(&mut self, _action: ActionId, _sequence: SequenceToken) {}

    /// Fired when a local cast starts
    fn on_cast_begin(&mut self) {}

    /// Fired when a local cast is interrupted
    fn on_cast_interrupt(&mut self) {}

    /// Fired when the host applies an authoritative lock from the server
    fn on_authoritative_lock_changed(&mut self, _update: &LockUpdate) {}

    /// Fired per network message
    fn on_network_message(&mut self, _direction: NetworkDirection) {}

    /// Fired once per host frame
    fn on_tick(&mut self, _delta: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl HostEventHandler for Recorder {
        fn on_action_submitted(&mut self, _action: ActionId, _sequence: SequenceToken) {
            self.calls.push("submit");
        }
        fn on_cast_begin(&mut self) {
            self.calls.push("cast_begin");
        }
        fn on_network_message(&mut self, _direction: NetworkDirection) {
            self.calls.push("network");
        }
        fn on_tick(&mut self, _delta: Duration) {
            self.calls.push("tick");
        }
    }

    #[test]
    fn test_dispatch_routes_variants() {
        let mut recorder = Recorder::default();
        let events = [
            HostEvent::ActionSubmitted {
                action: ActionId(1),
                sequence: SequenceToken(1),
            },
            HostEvent::CastBegin,
            HostEvent::CastInterrupt,
            HostEvent::NetworkMessage(NetworkDirection::Outbound),
            HostEvent::Tick(Duration::from_millis(16)),
        ];
        for event in &events {
            event.dispatch(&mut recorder);
        }

        // CastInterrupt falls through to the default no-op
        assert_eq!(
            recorder.calls,
            vec!["submit", "cast_begin", "network", "tick"]
        );
    }
}
