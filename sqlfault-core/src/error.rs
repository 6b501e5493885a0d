//! Error types for sqlfault operations.
//!
//! These errors describe failures of the subsystem itself (bad configuration,
//! a sink that cannot write). They are distinct from [`crate::ErrorRecord`],
//! which is the classified failure of the database client being reported on.
//! No variant ever carries query text or other secret literals.

use thiserror::Error;

/// Main error type for sqlfault operations.
#[derive(Debug, Error)]
pub enum SqlFaultError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with SqlFaultError
pub type Result<T> = std::result::Result<T, SqlFaultError>;

impl SqlFaultError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}
