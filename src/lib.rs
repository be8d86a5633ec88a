//! # lamco-lock-compensator
//!
//! Client-side latency compensation for action recovery locks.
//!
//! After the client submits an action the server answers with an
//! authoritative recovery lock, but only after a network round trip. Until
//! then the host holds a conservative default lock. This crate predicts the
//! real lock from what it learned about each action, applies the prediction
//! immediately, and reconciles once the server value arrives.
//!
//! # Architecture
//!
//! ```text
//! lamco-lock-compensator
//!   ├─> Host Interface (lock field, host state, event streams, bus, queue)
//!   ├─> Latency Compensator (predict on submit, reconcile on update)
//!   │     ├─> Lock Database (learned lock per action)
//!   │     ├─> Pending Lock Registry (prediction per sequence token)
//!   │     ├─> Packet Window Tracker (outbound packets, last 50 ms)
//!   │     └─> Statistics Accumulator (delay average, time saved)
//!   ├─> Lock Store (JSON file / in-memory persistence)
//!   └─> Replay (drive the compensator from a recorded trace)
//! ```
//!
//! # Data Flow
//!
//! **Submit:** Host → ActionSubmitted → Compensator → Lock Database → Live Lock
//!
//! **Reconcile:** Server → Host → AuthoritativeLockChanged → Compensator → Live Lock, Lock Database
//!
//! **Persist:** Host Tick → Compensator → Lock Store

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration
pub mod config;

/// Error types
pub mod error;

/// Identifier types
pub mod types;

/// Host capabilities and event plumbing
pub mod host;

/// Lock database and pending predictions
pub mod lock;

/// Outbound packet window
pub mod network;

/// Lock database persistence
pub mod store;

/// Prediction and reconciliation core
pub mod compensator;

/// Trace replay driver
pub mod replay;

/// Utility functions
pub mod utils;

pub use compensator::{CompensatorModule, LatencyCompensator};
pub use config::Config;
pub use error::{CompensatorError, Result};
