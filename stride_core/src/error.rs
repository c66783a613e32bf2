//! Error types for the stride_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stride_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structural validation of an imported document failed; every problem
    /// found is listed, not just the first
    #[error("plan document is invalid:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),

    /// A mutation addressed a week, day, or workout index that does not
    /// exist; the caller's view is out of sync with the document
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Session lifecycle error (e.g. mutating with no plan loaded)
    #[error("session error: {0}")]
    Session(String),
}
