//! Dynamics Error Types
//!
//! Unified error type for the collision and dynamics core. Functions that can
//! fail (pool loading, body lookup, state deserialization) return
//! `Result<T, DynamicsError>` instead of raw booleans or panicking.
//!
//! Load-time configuration errors are fatal by design: a malformed fragment
//! pool can never produce a valid simulation, so construction aborts with a
//! message naming the offending template. Runtime numerical edge cases are
//! never surfaced here; the tick recovers from them locally.

use thiserror::Error;

/// Unified error type for dynamics operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DynamicsError {
    /// A fragment pool template failed validation at load time.
    #[error("invalid fragment pool `{name}`: {reason}")]
    InvalidPool {
        /// Name of the offending pool template
        name: String,
        /// Human-readable description of the problem
        reason: &'static str,
    },

    /// A body handle does not refer to a live body (stale generation or
    /// out-of-range slot).
    #[error("invalid body handle (slot {index}, generation {generation})")]
    InvalidBodyId {
        /// Slot index of the handle
        index: u32,
        /// Generation of the handle
        generation: u32,
    },

    /// Invalid world configuration parameter.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the invalid configuration
        reason: &'static str,
    },

    /// State deserialization failed (corrupted or incompatible data).
    #[error("state deserialization failed: {reason}")]
    Malformed {
        /// What was wrong with the data
        reason: &'static str,
    },

    /// I/O error while reading or writing a state snapshot.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// Fragment pool configuration document could not be parsed.
    #[error("pool config parse error: {message}")]
    PoolConfig {
        /// Parser error message
        message: String,
    },
}

impl From<std::io::Error> for DynamicsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DynamicsError {
    fn from(err: serde_json::Error) -> Self {
        Self::PoolConfig {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
