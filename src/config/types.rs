//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Compensation policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationConfig {
    /// Apply predicted locks on submission
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Observe and log only, never write the live lock
    #[serde(default)]
    pub dry_run: bool,

    /// Share of the authoritative lock to remove on reconciliation (0-100)
    #[serde(default)]
    pub removal_percentage: f32,

    /// Weight of the newest sample in the delay moving average (0.0-1.0]
    #[serde(default = "default_delay_weight")]
    pub delay_weight: f32,

    /// Learn lock values from updates that arrive while casting
    #[serde(default)]
    pub learn_during_casts: bool,
}

fn default_enabled() -> bool {
    true
}
fn default_delay_weight() -> f32 {
    0.1
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dry_run: false,
            removal_percentage: 0.0,
            delay_weight: default_delay_weight(),
            learn_during_casts: false,
        }
    }
}

/// Lock prediction constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lock the host applies on every submission before any prediction (seconds)
    #[serde(default = "default_lock_secs")]
    pub default_lock_secs: f32,

    /// Round trip added to every prediction (seconds)
    #[serde(default = "default_simulated_rtt")]
    pub simulated_rtt_secs: f32,

    /// Learned values below this are ignored in favor of the default (seconds)
    #[serde(default = "default_min_recorded")]
    pub min_recorded_lock_secs: f32,
}

fn default_lock_secs() -> f32 {
    0.5
}
fn default_simulated_rtt() -> f32 {
    0.04
}
fn default_min_recorded() -> f32 {
    0.5
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_lock_secs: default_lock_secs(),
            simulated_rtt_secs: default_simulated_rtt(),
            min_recorded_lock_secs: default_min_recorded(),
        }
    }
}

/// Outbound packet window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketWindowConfig {
    /// Width of one histogram bucket (ms)
    #[serde(default = "default_bucket_ms")]
    pub bucket_ms: u64,

    /// Number of buckets in the window
    #[serde(default = "default_bucket_count")]
    pub bucket_count: usize,

    /// Packets in the window at submission that count as a burst
    #[serde(default = "default_burst_threshold")]
    pub burst_threshold: u32,
}

fn default_bucket_ms() -> u64 {
    10
}
fn default_bucket_count() -> usize {
    5
}
fn default_burst_threshold() -> u32 {
    2
}

impl Default for PacketWindowConfig {
    fn default() -> Self {
        Self {
            bucket_ms: default_bucket_ms(),
            bucket_count: default_bucket_count(),
            burst_threshold: default_burst_threshold(),
        }
    }
}

/// Pending lock registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum outstanding predictions kept before the oldest is evicted
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

fn default_max_pending() -> usize {
    256
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Lock database file (None = platform data directory)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl PersistenceConfig {
    /// Resolve the database path, falling back to the local data directory
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| {
                    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                        .join(".local/share")
                })
                .join("lamco-lock-compensator")
                .join("locks.json")
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files (None = console only)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
        }
    }
}
