//! Error types for a3s-tps
//!
//! Only collaborator and configuration failures are errors. Missing or
//! malformed timing data is not: it degrades to "no metric this turn".

use thiserror::Error;

/// Errors that can occur while talking to the host or loading configuration
#[derive(Debug, Error)]
pub enum TpsError {
    /// Message history could not be fetched
    #[error("Failed to fetch messages for session '{session_id}': {reason}")]
    Fetch {
        session_id: String,
        reason: String,
    },

    /// Report message could not be posted
    #[error("Failed to dispatch report to session '{session_id}': {reason}")]
    Dispatch {
        session_id: String,
        reason: String,
    },

    /// Event feed failure
    #[error("Event stream error: {0}")]
    Stream(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session or message not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for counter operations
pub type Result<T> = std::result::Result<T, TpsError>;
