//! Client Error Types
//!
//! This module defines the error taxonomy shared by every component of the
//! client core: the remote gateway, the local durable store, the sync engine
//! and the notification bridge.
//!
//! # Error Categories
//!
//! - `Network` - a fetch failed or the server answered with a non-2xx status
//! - `StorageUnavailable` - the local database could not be opened
//! - `PermissionDenied` - notification permission refused or blocked
//! - `Validation` - the server rejected a payload with a message body
//! - `Serialization` - JSON encoding/decoding failures
//! - `Config` - invalid client configuration
//!
//! # Usage
//!
//! ```rust
//! use tienda_client::error::ClientError;
//!
//! let error = ClientError::network(404, "order not found");
//! assert_eq!(error.status(), Some(404));
//! ```

use thiserror::Error;

/// Errors surfaced by the client core
#[derive(Debug, Error)]
pub enum ClientError {
    /// A network fetch failed or the server answered with a non-2xx status
    #[error("network error ({status}): {message}")]
    Network {
        /// HTTP status code; 0 when the request never reached the server
        status: u16,
        /// Human-readable error message
        message: String,
    },

    /// The local database could not be opened or provisioned
    #[error("local storage unavailable: {message}")]
    StorageUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// Notification permission was refused or is blocked by the host
    #[error("notification permission denied")]
    PermissionDenied,

    /// The server rejected a payload and returned a message body
    #[error("validation error ({status}): {message}")]
    Validation {
        /// HTTP status code of the rejection
        status: u16,
        /// Message field extracted from the error body
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },

    /// A storage-layer query failed after the database was opened
    #[error("storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },

    /// Invalid client configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Create a new network error carrying the HTTP status
    pub fn network(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    /// Create a new storage-unavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(status: u16, message: impl Into<String>) -> Self {
        Self::Validation {
            status,
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } | Self::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        Self::Network {
            status,
            message: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ClientError>;
