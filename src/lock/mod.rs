//! Lock bookkeeping
//!
//! - **LockDatabase**: learned lock per action type, persisted across sessions
//! - **PendingLockRegistry**: predictions waiting for their authoritative update

mod database;
mod pending;

pub use database::LockDatabase;
pub use pending::{PendingLock, PendingLockRegistry};
