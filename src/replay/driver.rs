//! Emulated host for trace replay
//!
//! Plays the role of the host process: owns the live lock field, counts it
//! down every frame, applies server locks before publishing them, and feeds
//! every event to an attached [`CompensatorModule`].

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::compensator::{CompensatorModule, CompensatorReport, LatencyCompensator};
use crate::config::Config;
use crate::host::{
    EventBus, HostEvent, HostEventBus, LockUpdate, SharedHostState, SharedLockField,
};
use crate::store::LockStore;
use crate::types::ActorId;

use super::trace::TraceEntry;

/// Actor the replayed client controls
pub const REPLAY_ACTOR: ActorId = ActorId(1);

/// Result of a replay run
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    /// Trace entries applied
    pub entries: usize,
    /// Submissions seen
    pub submissions: usize,
    /// Server lock updates seen
    pub updates: usize,
    /// Sum of all tick lengths
    pub simulated_time: Duration,
    /// Compensator state after detaching
    pub report: CompensatorReport,
}

/// Host emulation driving a compensator from trace entries
pub struct ReplayDriver {
    bus: HostEventBus,
    module: CompensatorModule,
    live: SharedLockField,
    host: SharedHostState,
    default_lock: f32,
    entries: usize,
    submissions: usize,
    updates: usize,
    simulated_time: Duration,
}

impl ReplayDriver {
    /// Build a compensator over `store` and attach it to a fresh bus
    pub fn new(config: Config, store: Box<dyn LockStore + Send>) -> Self {
        let default_lock = config.lock.default_lock_secs;
        let live = SharedLockField::new(0.0);
        let host = SharedHostState::with_local_actor(REPLAY_ACTOR);

        let compensator =
            LatencyCompensator::new(config, Box::new(live.clone()), Box::new(host.clone()), store);
        let mut module = CompensatorModule::new(compensator);
        let mut bus = HostEventBus::new();
        module.attach(&mut bus);

        Self {
            bus,
            module,
            live,
            host,
            default_lock,
            entries: 0,
            submissions: 0,
            updates: 0,
            simulated_time: Duration::ZERO,
        }
    }

    /// Apply one trace entry the way the host would
    pub fn apply(&mut self, entry: &TraceEntry) {
        self.entries += 1;

        match *entry {
            TraceEntry::Submit { action, sequence } => {
                self.submissions += 1;
                // Host arms its default lock when an idle client acts
                if self.live.get() <= 0.0 {
                    self.live.set(self.default_lock);
                }
                self.bus
                    .publish(&HostEvent::ActionSubmitted { action, sequence });
            }
            TraceEntry::CastBegin => self.bus.publish(&HostEvent::CastBegin),
            TraceEntry::CastInterrupt => self.bus.publish(&HostEvent::CastInterrupt),
            TraceEntry::LockUpdate {
                action,
                sequence,
                new_lock,
                source,
            } => {
                self.updates += 1;
                let old_lock = self.live.get();
                self.live.set(new_lock);
                self.bus
                    .publish(&HostEvent::AuthoritativeLockChanged(LockUpdate {
                        source: source.unwrap_or(REPLAY_ACTOR),
                        sequence,
                        action,
                        old_lock,
                        new_lock,
                    }));
            }
            TraceEntry::Packet { direction } => {
                self.bus.publish(&HostEvent::NetworkMessage(direction))
            }
            TraceEntry::Tick { ms } => {
                let delta = Duration::from_millis(ms);
                self.simulated_time += delta;
                self.live
                    .set((self.live.get() - delta.as_secs_f32()).max(0.0));
                self.bus.publish(&HostEvent::Tick(delta));
            }
            TraceEntry::Combat { active } => {
                debug!("Combat {}", if active { "started" } else { "ended" });
                self.host.set_protected(active);
            }
            TraceEntry::Anticheat => self.module.with(|c| c.mark_anticheat_detected()),
        }
    }

    /// Current live lock (seconds)
    pub fn live_lock(&self) -> f32 {
        self.live.get()
    }

    /// The attached module
    pub fn module(&self) -> &CompensatorModule {
        &self.module
    }

    /// Detach (persisting state) and summarize
    pub fn finish(mut self) -> ReplaySummary {
        self.host.set_protected(false);
        self.module.detach(&mut self.bus);
        ReplaySummary {
            entries: self.entries,
            submissions: self.submissions,
            updates: self.updates,
            simulated_time: self.simulated_time,
            report: self.module.report(),
        }
    }
}
