//! Latency compensation core
//!
//! | Component | Role |
//! |-----------|------|
//! | [`LatencyCompensator`] | Predict on submit, reconcile on server update |
//! | [`StatisticsAccumulator`] | Delay estimate and savings counters |
//! | [`CompensatorModule`] | Attach/detach lifecycle against a host bus |
//! | [`CompensatorReport`] | Status snapshot |

mod engine;
mod module;
mod report;
mod stats;

pub use engine::{LatencyCompensator, ReconcileOutcome, SubmitOutcome};
pub use module::CompensatorModule;
pub use report::{format_span, CompensatorReport};
pub use stats::StatisticsAccumulator;
