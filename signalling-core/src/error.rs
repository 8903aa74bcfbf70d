//! Error Types
//!
//! The engine has a single failure class visible to callers: invalid
//! configuration. Everything else (duplicate registration, unreachable
//! producers, stale caches) is normal churn and is absorbed internally.

use thiserror::Error;

/// Errors raised when host-supplied configuration cannot be interpreted.
#[derive(Debug, Error)]
pub enum SignalError {
    /// A consumer mode name did not match any known aggregation mode.
    #[error("unknown consumer mode: {0}")]
    UnknownMode(String),

    /// A gate type name did not match any known gate.
    #[error("unknown gate type: {0}")]
    UnknownGate(String),

    /// A face name did not match any of the six faces.
    #[error("unknown face: {0}")]
    UnknownFace(String),

    /// A raw strength was negative but not the unbounded sentinel (-1).
    #[error("invalid signal strength {0}, expected -1 or a value >= 0")]
    InvalidStrength(i64),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SignalError>;
