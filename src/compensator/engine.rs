//! Latency Compensator
//!
//! Predicts the recovery lock of a locally submitted action before the
//! server answers, then reconciles once the authoritative lock arrives.
//!
//! # Protocol
//!
//! ```text
//! Idle ──submit(action, seq)──> Predicted ──update(old != new, local)──> Idle
//!   │  live == default lock?       │  effective = new * (1 - removal%)
//!   │  predicted = db.lookup()     │  live = effective       (unless dry-run)
//!   │  live = predicted            │  db[action] = new       (unless dry-run)
//!   │       (unless dry-run)       │  stats.observe(delay)
//!   │  pending[seq] = predicted    │  stats.record_savings(new - effective)
//! ```
//!
//! The baseline check is an exact comparison against the configured default
//! lock. Any other live value means another prediction or a host-side lock is
//! already in effect, and the submission is left alone.
//!
//! # Failure Policy
//!
//! Handlers never propagate errors to the host. Every value is computed and
//! checked before the live field is written, so a failed reconciliation
//! leaves the host's authoritative lock exactly as the host set it.
//!
//! # Persistence
//!
//! Learning a new lock or counting a saving only marks state dirty. The flush happens from
//! [`on_tick`](HostEventHandler::on_tick) once the host leaves its protected
//! state, so no file I/O runs on the submission or reconciliation path.

use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::{CompensatorError, Result};
use crate::host::{HostEventHandler, HostState, LockField, LockUpdate};
use crate::lock::{LockDatabase, PendingLock, PendingLockRegistry};
use crate::network::PacketWindowTracker;
use crate::store::{LockStore, PersistedState};
use crate::types::{ActionId, NetworkDirection, SequenceToken};

use super::report::CompensatorReport;
use super::stats::StatisticsAccumulator;

/// What happened to a submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    /// Compensation is switched off
    Disabled,
    /// Live lock was not at the default, prediction skipped
    NotAtBaseline {
        /// Live lock at submission
        live: f32,
    },
    /// Prediction recorded
    Predicted {
        /// Predicted lock (seconds)
        predicted: f32,
        /// Whether it was written to the live field
        applied: bool,
    },
}

/// What happened to an authoritative update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Old and new lock are equal, nothing to learn
    Unchanged,
    /// Update belongs to another actor
    ForeignActor,
    /// Compensation is switched off
    Disabled,
    /// Update processed
    Reconciled {
        /// Lock after removal policy (seconds)
        effective: f32,
        /// Whether `effective` was written to the live field
        written: bool,
        /// Whether a prediction was found for the sequence token
        correlated: bool,
        /// Whether the database learned a new value
        learned: bool,
    },
}

/// Prediction and reconciliation engine
///
/// Owns all compensation state. Construct it from a [`Config`] plus the host
/// capabilities, call [`load`](Self::load) before feeding events, and
/// [`save`](Self::save) when shutting down.
pub struct LatencyCompensator {
    config: Config,
    lock_field: Box<dyn LockField + Send>,
    host: Box<dyn HostState + Send>,
    store: Box<dyn LockStore + Send>,
    database: LockDatabase,
    pending: PendingLockRegistry,
    packets: PacketWindowTracker,
    stats: StatisticsAccumulator,
    casting: bool,
    anticheat_detected: bool,
}

impl LatencyCompensator {
    /// Create a compensator with an empty database
    pub fn new(
        config: Config,
        lock_field: Box<dyn LockField + Send>,
        host: Box<dyn HostState + Send>,
        store: Box<dyn LockStore + Send>,
    ) -> Self {
        Self {
            database: LockDatabase::new(&config.lock),
            pending: PendingLockRegistry::new(config.registry.max_pending),
            packets: PacketWindowTracker::new(&config.packets),
            stats: StatisticsAccumulator::new(config.compensation.delay_weight),
            config,
            lock_field,
            host,
            store,
            casting: false,
            anticheat_detected: false,
        }
    }

    /// Load learned locks and counters from the store
    pub fn load(&mut self) -> Result<()> {
        let state = self.store.load()?;
        self.stats
            .restore(state.total_actions_affected, state.total_seconds_saved);
        self.database.load_entries(state.locks);
        info!(
            "Lock compensator loaded {} learned locks ({} actions affected so far)",
            self.database.len(),
            self.stats.actions_affected()
        );
        Ok(())
    }

    /// Persist learned locks and counters now
    pub fn save(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        self.store.persist(&snapshot)?;
        self.database.mark_clean();
        self.stats.mark_clean();
        Ok(())
    }

    /// Drop outstanding predictions and packet history
    ///
    /// Called when the module stops receiving events; updates for the
    /// dropped tokens will never arrive.
    pub fn abandon_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!("Abandoning {} pending predictions", self.pending.len());
        }
        self.pending.clear();
        self.packets.reset();
    }

    /// State as it would be persisted
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            locks: self.database.entries().clone(),
            total_actions_affected: self.stats.actions_affected(),
            total_seconds_saved: self.stats.seconds_saved(),
            saved_at: None,
        }
        .stamped()
    }

    /// Apply a prediction for a local submission
    pub fn submit(&mut self, action: ActionId, sequence: SequenceToken) -> SubmitOutcome {
        let packets_in_window = self.packets.current_window_sum();

        if !self.config.compensation.enabled {
            return SubmitOutcome::Disabled;
        }

        let live = self.lock_field.read();
        if live != self.database.default_lock() {
            debug!(
                "Skipping prediction for {} ({}): live lock {:.0} ms is not at baseline",
                action,
                sequence,
                live * 1000.0
            );
            return SubmitOutcome::NotAtBaseline { live };
        }

        let predicted = self.database.lookup(action);
        let applied = if self.is_dry_run() {
            false
        } else {
            match self.lock_field.write(predicted) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to apply predicted lock for {}: {}", action, e);
                    false
                }
            }
        };

        self.pending.reserve(
            sequence,
            PendingLock {
                action,
                predicted,
                started_from: if applied { predicted } else { live },
                applied,
                packets_in_window,
            },
        );

        if packets_in_window >= self.config.packets.burst_threshold {
            self.stats.record_burst();
            debug!(
                "{} submitted with {} packets in the last {:?}, expect a delayed response",
                action,
                packets_in_window,
                self.packets.window()
            );
        }

        debug!(
            "{} {:.0} ms lock for {} ({})",
            if applied { "Applying" } else { "Predicted" },
            predicted * 1000.0,
            action,
            sequence
        );

        SubmitOutcome::Predicted { predicted, applied }
    }

    /// Reconcile an authoritative lock update
    ///
    /// Returns an error only before anything was mutated.
    pub fn reconcile(&mut self, update: &LockUpdate) -> Result<ReconcileOutcome> {
        if update.old_lock == update.new_lock {
            return Ok(ReconcileOutcome::Unchanged);
        }

        if self.host.local_actor() != Some(update.source) {
            return Ok(ReconcileOutcome::ForeignActor);
        }

        if !self.config.compensation.enabled {
            return Ok(ReconcileOutcome::Disabled);
        }

        let old_lock = CompensatorError::check_lock(update.old_lock)?;
        let new_lock = CompensatorError::check_lock(update.new_lock)?;
        let removal = self.removal_fraction()?;
        let effective = new_lock * (1.0 - removal);
        let dry_run = self.is_dry_run();

        if !dry_run {
            self.lock_field.write(effective)?;
        }

        let was_casting = std::mem::replace(&mut self.casting, false);
        let mut learned = false;

        let correlated = match self.pending.settle(update.sequence) {
            Some(pending) => {
                let delay = (pending.started_from - old_lock).max(0.0);
                let average = self.stats.observe(delay);

                if !dry_run {
                    if !was_casting || self.config.compensation.learn_during_casts {
                        learned = self.database.record(update.action, new_lock)?;
                    }
                    if pending.applied {
                        self.stats.record_savings(new_lock - effective);
                    }
                }

                debug!(
                    "{} ({}) answered after {:.0} ms (avg {:.0} ms, {} packets at submission): \
                     predicted {:.0} ms, server {:.0} ms, effective {:.0} ms",
                    update.action,
                    update.sequence,
                    delay * 1000.0,
                    average * 1000.0,
                    pending.packets_in_window,
                    pending.predicted * 1000.0,
                    new_lock * 1000.0,
                    effective * 1000.0
                );
                true
            }
            None => {
                trace!(
                    "No prediction recorded for {} ({})",
                    update.sequence,
                    update.action
                );
                false
            }
        };

        Ok(ReconcileOutcome::Reconciled {
            effective,
            written: !dry_run,
            correlated,
            learned,
        })
    }

    /// Flush learned locks and counters if either changed and the host allows I/O
    fn flush_if_due(&mut self) {
        if !(self.database.is_dirty() || self.stats.is_dirty()) || self.host.in_protected_state()
        {
            return;
        }

        // Failures are retried on the next change, not every tick
        match self.save() {
            Ok(()) => debug!("Lock database persisted ({} entries)", self.database.len()),
            Err(e) => {
                warn!("Failed to persist lock database: {}", e);
                self.database.mark_clean();
                self.stats.mark_clean();
            }
        }
    }

    fn removal_fraction(&self) -> Result<f32> {
        let pct = self.config.compensation.removal_percentage;
        if (0.0..=100.0).contains(&pct) {
            Ok(pct / 100.0)
        } else {
            Err(CompensatorError::InvalidRemovalPercentage(pct))
        }
    }

    /// Whether live state must be left untouched
    pub fn is_dry_run(&self) -> bool {
        self.anticheat_detected || self.config.compensation.dry_run
    }

    /// Latch dry-run for the rest of the session
    pub fn mark_anticheat_detected(&mut self) {
        if !self.anticheat_detected {
            warn!("Anticheat detected, lock compensation forced into dry-run");
        }
        self.anticheat_detected = true;
    }

    /// Whether anticheat forced dry-run
    pub fn anticheat_detected(&self) -> bool {
        self.anticheat_detected
    }

    /// Whether compensation is switched on
    pub fn is_enabled(&self) -> bool {
        self.config.compensation.enabled
    }

    /// Switch compensation on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.config.compensation.enabled {
            info!("Lock compensation {}", if enabled { "enabled" } else { "disabled" });
        }
        self.config.compensation.enabled = enabled;
    }

    /// Request observe-only mode (anticheat overrides a `false`)
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.config.compensation.dry_run = dry_run;
    }

    /// Share of the authoritative lock removed on reconciliation (0-100)
    pub fn removal_percentage(&self) -> f32 {
        self.config.compensation.removal_percentage
    }

    /// Change the removal share (0-100)
    pub fn set_removal_percentage(&mut self, pct: f32) -> Result<()> {
        if !(0.0..=100.0).contains(&pct) {
            return Err(CompensatorError::InvalidRemovalPercentage(pct));
        }
        self.config.compensation.removal_percentage = pct;
        Ok(())
    }

    /// Whether a local cast is in progress
    pub fn is_casting(&self) -> bool {
        self.casting
    }

    /// Learned locks
    pub fn database(&self) -> &LockDatabase {
        &self.database
    }

    /// Mutable access to learned locks (editing tools, imports)
    pub fn database_mut(&mut self) -> &mut LockDatabase {
        &mut self.database
    }

    /// Outstanding predictions
    pub fn pending(&self) -> &PendingLockRegistry {
        &self.pending
    }

    /// Outbound packet window
    pub fn packets(&self) -> &PacketWindowTracker {
        &self.packets
    }

    /// Reporting counters
    pub fn stats(&self) -> &StatisticsAccumulator {
        &self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot for UI and logs
    pub fn report(&self) -> CompensatorReport {
        CompensatorReport {
            enabled: self.config.compensation.enabled,
            removal_percentage: self.config.compensation.removal_percentage,
            dry_run: self.is_dry_run(),
            anticheat_detected: self.anticheat_detected,
            casting: self.casting,
            total_actions_affected: self.stats.actions_affected(),
            total_time_saved: self.stats.time_saved(),
            average_delay: Duration::try_from_secs_f32(self.stats.average_delay())
                .unwrap_or_default(),
            burst_submissions: self.stats.burst_submissions(),
            learned_locks: self.database.len(),
            pending_predictions: self.pending.len(),
            packets_in_window: self.packets.current_window_sum(),
        }
    }
}

impl HostEventHandler for LatencyCompensator {
    fn on_action_submitted(&mut self, action: ActionId, sequence: SequenceToken) {
        self.submit(action, sequence);
    }

    fn on_cast_begin(&mut self) {
        self.casting = true;
    }

    fn on_cast_interrupt(&mut self) {
        self.casting = false;
    }

    fn on_authoritative_lock_changed(&mut self, update: &LockUpdate) {
        if let Err(e) = self.reconcile(update) {
            warn!(
                "Error applying lock update for {} ({}): {}",
                update.action, update.sequence, e
            );
        }
    }

    fn on_network_message(&mut self, direction: NetworkDirection) {
        if direction == NetworkDirection::Outbound {
            self.packets.on_outbound_packet();
        }
    }

    fn on_tick(&mut self, delta: Duration) {
        self.packets.tick(delta);
        self.flush_if_due();
    }
}
