// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Giggle chat relay.

use thiserror::Error;

/// The primary error type used across all Giggle adapter traits and core operations.
#[derive(Debug, Error)]
pub enum GiggleError {
    /// Configuration errors (invalid TOML, missing tokens, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (send failure, reaction/typing failure, bad ids).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Completion service errors (transport, non-2xx status, malformed response).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GiggleError {
    /// Shorthand for a [`GiggleError::Completion`] without an underlying source.
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`GiggleError::Channel`] without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }
}
