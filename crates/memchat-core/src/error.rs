//! Error types for the memchat crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire memchat workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. No variant is fatal to the
/// process: every failure resolves the pipeline back to idle so the caller
/// can retry.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MemchatError {
    /// Input rejected before any state change (empty key, value, or text)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend service could not be reached
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend service explicitly refused the operation
    #[error("Backend rejected the request: {0}")]
    BackendRejected(String),

    /// IO error (local store file operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MemchatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a BackendUnavailable error
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Creates a BackendRejected error
    pub fn backend_rejected(message: impl Into<String>) -> Self {
        Self::BackendRejected(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidArgument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a BackendUnavailable error
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    /// Check if this is a BackendRejected error
    pub fn is_backend_rejected(&self) -> bool {
        matches!(self, Self::BackendRejected(_))
    }

    /// Check if this error came from the backend rather than caller input.
    ///
    /// Returns true for `BackendUnavailable` and `BackendRejected`. These
    /// are surfaced to the user as a failure turn and leave state unchanged.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::BackendRejected(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MemchatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MemchatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MemchatError>`.
pub type Result<T> = std::result::Result<T, MemchatError>;
