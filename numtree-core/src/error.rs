//! Structured error types for numtree-core.
//!
//! Uses `thiserror` so the server can map each failure onto an HTTP
//! status. The CLI wraps these in `anyhow` for convenience.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for numtree-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Divide operation with a zero operand
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    /// Operation produced an infinite or NaN value
    #[error("Result of {parent} {symbol} {operand} is not a finite number")]
    NonFiniteResult {
        parent: f64,
        symbol: char,
        operand: f64,
    },

    /// Operation name is not one of add, subtract, multiply, divide
    #[error("Unknown operation '{value}'")]
    UnknownOperation { value: String },

    /// Stored child value disagrees with its recomputed derivation
    #[error("Derivation mismatch: expected {expected}, stored {stored}")]
    Mismatch { expected: f64, stored: f64 },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Config file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// Config file is not valid TOML for the expected shape
    #[error("Invalid config file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Result type alias for numtree-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an unknown operation error
    pub fn unknown_operation(value: impl Into<String>) -> Self {
        Self::UnknownOperation {
            value: value.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
