//! Trace file format
//!
//! One JSON object per line, tagged by `event`:
//!
//! ```text
//! {"event":"submit","action":7,"sequence":1}
//! {"event":"packet","direction":"outbound"}
//! {"event":"tick","ms":16}
//! {"event":"lock_update","action":7,"sequence":1,"new_lock":0.6}
//! {"event":"cast_begin"}
//! {"event":"cast_interrupt"}
//! {"event":"combat","active":true}
//! {"event":"anticheat"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. `lock_update` takes
//! its old lock from the replayed live field; `source` defaults to the local
//! actor.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{ActionId, ActorId, NetworkDirection, SequenceToken};

/// One recorded host event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEntry {
    /// Local action submission
    Submit {
        /// Action type
        action: ActionId,
        /// Correlation token
        sequence: SequenceToken,
    },
    /// Local cast started
    CastBegin,
    /// Local cast interrupted
    CastInterrupt,
    /// Server lock arrived
    LockUpdate {
        /// Action the server resolved
        action: ActionId,
        /// Token of the answered submission
        sequence: SequenceToken,
        /// Server lock (seconds)
        new_lock: f32,
        /// Effect source, local actor when absent
        #[serde(default)]
        source: Option<ActorId>,
    },
    /// Network message
    Packet {
        /// Message direction
        direction: NetworkDirection,
    },
    /// Frame advance
    Tick {
        /// Frame length in milliseconds
        ms: u64,
    },
    /// Combat (protected state) change
    Combat {
        /// Whether combat started
        active: bool,
    },
    /// Anticheat plugin detected
    Anticheat,
}

/// Parse one trace line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<TraceEntry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let entry = serde_json::from_str(line)
        .with_context(|| format!("Invalid trace entry on line {}", line_no))?;
    Ok(Some(entry))
}
