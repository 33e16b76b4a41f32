//! Error types for errorprop-engine
//!
//! "No data" is never an error here: propagators report it as `Ok(false)`.
//! These variants cover malformed host input and configuration/IO failures.

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for errorprop-engine operations
#[derive(Debug, Error)]
pub enum ErrorPropError {
    /// The host model violates a structural precondition
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A call or lookup referenced a function id that does not exist
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ErrorPropError {
    /// Create a malformed-input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        ErrorPropError::MalformedInput(msg.into())
    }

    /// Create an unknown-function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        ErrorPropError::UnknownFunction(name.into())
    }
}

/// Result type alias for error propagation operations
pub type Result<T> = std::result::Result<T, ErrorPropError>;
