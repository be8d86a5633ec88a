//! Configuration management
//!
//! Handles loading and validation of configuration from:
//! - TOML files
//! - CLI arguments (dry-run, store path overrides)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod types;

pub use types::{
    CompensationConfig, LockConfig, LoggingConfig, PacketWindowConfig, PersistenceConfig,
    RegistryConfig,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Compensation policy
    #[serde(default)]
    pub compensation: CompensationConfig,
    /// Lock prediction constants
    #[serde(default)]
    pub lock: LockConfig,
    /// Outbound packet window
    #[serde(default)]
    pub packets: PacketWindowConfig,
    /// Pending lock registry
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Lock database persistence
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let removal = self.compensation.removal_percentage;
        if !(0.0..=100.0).contains(&removal) {
            anyhow::bail!("removal_percentage ({}) must be between 0 and 100", removal);
        }

        let weight = self.compensation.delay_weight;
        if !(weight > 0.0 && weight <= 1.0) {
            anyhow::bail!("delay_weight ({}) must be in (0, 1]", weight);
        }

        for (name, value) in [
            ("default_lock_secs", self.lock.default_lock_secs),
            ("simulated_rtt_secs", self.lock.simulated_rtt_secs),
            ("min_recorded_lock_secs", self.lock.min_recorded_lock_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{} ({}) must be a non-negative number", name, value);
            }
        }

        // A zero round trip would make predictions look instantaneous
        if self.lock.simulated_rtt_secs <= 0.0 {
            anyhow::bail!("simulated_rtt_secs must be greater than zero");
        }

        if self.packets.bucket_ms == 0 {
            anyhow::bail!("packets.bucket_ms must be greater than zero");
        }
        if self.packets.bucket_count == 0 {
            anyhow::bail!("packets.bucket_count must be greater than zero");
        }

        if self.registry.max_pending == 0 {
            anyhow::bail!("registry.max_pending must be greater than zero");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, dry_run: bool, store: Option<PathBuf>) -> Self {
        if dry_run {
            self.compensation.dry_run = true;
        }
        if let Some(path) = store {
            self.persistence.path = Some(path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.compensation.enabled);
        assert!(!config.compensation.dry_run);
        assert_eq!(config.compensation.removal_percentage, 0.0);
        assert_eq!(config.lock.default_lock_secs, 0.5);
        assert_eq!(config.lock.simulated_rtt_secs, 0.04);
        assert_eq!(config.packets.bucket_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [compensation]
            removal_percentage = 25.0

            [lock]
            default_lock_secs = 0.6
            "#,
        )
        .unwrap();

        assert_eq!(config.compensation.removal_percentage, 25.0);
        assert!(config.compensation.enabled);
        assert_eq!(config.lock.default_lock_secs, 0.6);
        assert_eq!(config.lock.simulated_rtt_secs, 0.04);
        assert_eq!(config.registry.max_pending, 256);
    }

    #[test]
    fn test_config_validation_removal_range() {
        let mut config = Config::default();
        config.compensation.removal_percentage = 120.0;
        assert!(config.validate().is_err());

        config.compensation.removal_percentage = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_rtt() {
        let mut config = Config::default();
        config.lock.simulated_rtt_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config =
            Config::default().with_overrides(true, Some(PathBuf::from("/tmp/locks.json")));
        assert!(config.compensation.dry_run);
        assert_eq!(
            config.persistence.resolved_path(),
            PathBuf::from("/tmp/locks.json")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[compensation]\ndry_run = true\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert!(config.compensation.dry_run);

        std::fs::write(&path, "[compensation]\ndelay_weight = 0.0\n").unwrap();
        assert!(Config::load(path.to_str().unwrap()).is_err());
    }
}
