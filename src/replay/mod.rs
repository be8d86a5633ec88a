//! Trace replay
//!
//! Drives the compensator from a recorded JSON-lines trace, standing in for
//! the host process. Used by the `lamco-lock-compensator` binary to tune
//! configuration offline and to seed a lock database from recorded play.
//!
//! ```text
//! trace.jsonl ──> parse_line ──> ReplayDriver ──> HostEventBus ──> CompensatorModule
//!                                  (live lock,                        │
//!                                   countdown)                        └─> LockStore
//! ```

mod driver;
mod trace;

pub use driver::{ReplayDriver, ReplaySummary, REPLAY_ACTOR};
pub use trace::{parse_line, TraceEntry};

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Replay a trace file through `driver`
///
/// With `realtime`, every tick sleeps for its recorded length so log output
/// lines up with the original session.
pub async fn replay_file(
    path: &Path,
    mut driver: ReplayDriver,
    realtime: bool,
) -> Result<ReplaySummary> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open trace file: {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    info!("Replaying trace: {}", path.display());

    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let Some(entry) = parse_line(&line, line_no)? else {
            continue;
        };

        if realtime {
            if let TraceEntry::Tick { ms } = entry {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }

        driver.apply(&entry);
    }

    debug!("Trace exhausted after {} lines", line_no);
    Ok(driver.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use crate::types::ActionId;
    use std::io::Write;

    #[tokio::test]
    async fn test_replay_file() {
        let mut trace = tempfile::NamedTempFile::new().unwrap();
        writeln!(trace, "# two uses of action 7").unwrap();
        writeln!(trace, r#"{{"event":"submit","action":7,"sequence":1}}"#).unwrap();
        writeln!(trace, r#"{{"event":"tick","ms":50}}"#).unwrap();
        writeln!(trace, r#"{{"event":"lock_update","action":7,"sequence":1,"new_lock":0.6}}"#)
            .unwrap();
        writeln!(trace).unwrap();
        writeln!(trace, r#"{{"event":"tick","ms":16}}"#).unwrap();

        let store = MemoryStore::new();
        let driver = ReplayDriver::new(Config::default(), Box::new(store.clone()));
        let summary = replay_file(trace.path(), driver, false).await.unwrap();

        assert_eq!(summary.entries, 4);
        assert_eq!(summary.report.learned_locks, 1);
        assert_eq!(store.state().locks.get(&ActionId(7)), Some(&0.6));
    }

    #[tokio::test]
    async fn test_bad_line_is_error() {
        let mut trace = tempfile::NamedTempFile::new().unwrap();
        writeln!(trace, r#"{{"event":"tick","ms":16}}"#).unwrap();
        writeln!(trace, "not json").unwrap();

        let driver = ReplayDriver::new(Config::default(), Box::new(MemoryStore::new()));
        let err = replay_file(trace.path(), driver, false).await.unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
