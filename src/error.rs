//! Compensator Error Types
//!
//! Errors raised inside the compensator. None of them are fatal to the host:
//! event handlers catch them, log, and leave the live lock untouched.

use thiserror::Error;

/// Result type for compensator operations
pub type Result<T> = std::result::Result<T, CompensatorError>;

/// Compensator error types
#[derive(Error, Debug)]
pub enum CompensatorError {
    /// A lock value was NaN, infinite, or negative
    #[error("Invalid lock value: {0}")]
    InvalidLock(f32),

    /// Removal percentage outside 0-100
    #[error("Removal percentage {0} outside 0-100")]
    InvalidRemovalPercentage(f32),

    /// The host refused a write to the live lock field
    #[error("Live lock field write failed: {0}")]
    LockFieldWrite(String),

    /// Persistence backend failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization of persisted state failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompensatorError {
    /// Check a lock value coming from the host or the server
    pub fn check_lock(secs: f32) -> Result<f32> {
        if secs.is_finite() && secs >= 0.0 {
            Ok(secs)
        } else {
            Err(Self::InvalidLock(secs))
        }
    }

    /// Whether the error originated in the persistence layer
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::Serialization(_) | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_lock() {
        assert!(CompensatorError::check_lock(0.0).is_ok());
        assert!(CompensatorError::check_lock(0.64).is_ok());
        assert!(CompensatorError::check_lock(-0.1).is_err());
        assert!(CompensatorError::check_lock(f32::NAN).is_err());
        assert!(CompensatorError::check_lock(f32::INFINITY).is_err());
    }

    #[test]
    fn test_persistence_classification() {
        let io = CompensatorError::Io(std::io::Error::other("disk full"));
        assert!(io.is_persistence());
        assert!(!CompensatorError::InvalidLock(-1.0).is_persistence());
    }
}
