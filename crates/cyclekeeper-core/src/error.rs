//! Core error types for cyclekeeper-core.
//!
//! Errors are split per concern using thiserror. Cycle transitions only
//! ever fail locally: a rejected operation leaves the history untouched.

use std::path::PathBuf;
use thiserror::Error;

use crate::cycle::CycleId;

/// Core error type for cyclekeeper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Cycle transition errors
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by cycle store transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// Structurally invalid input for a new cycle
    #[error("invalid cycle input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A new cycle was requested while another one is still running
    #[error("cycle {active_id} is still active; interrupt it before starting a new one")]
    AlreadyActive { active_id: CycleId },

    /// Identifier already used by a cycle in history
    #[error("cycle id {id} is already in use")]
    DuplicateId { id: CycleId },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task label is empty or whitespace only
    #[error("task must not be empty")]
    EmptyTask,

    /// Duration is zero or negative
    #[error("duration must be positive, got {minutes} minutes")]
    NonPositiveDuration { minutes: i64 },

    /// Value outside the configured bounds
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: i64,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
