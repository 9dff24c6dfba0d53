//! Error types for phonebook.
//!
//! This module defines the error type shared by the storage layer, the
//! configuration loader and the HTTP surface. The HTTP layer decides which of
//! these variants reach the client as a `400` and which stay internal.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// The main error type for phonebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// An identifier did not have the shape the store assigns.
    #[error("malformed contact id: {value:?}")]
    MalformedId {
        /// The rejected identifier text.
        value: String,
    },

    /// A write was rejected by the field validation rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// No listen port was supplied.
    #[error("no listen port configured: set PORT, PHONEBOOK_SERVER__PORT or --port")]
    MissingPort,

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for phonebook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("storage task failed: {err}"))
    }
}

impl Error {
    /// Create a malformed id error for the given text.
    #[must_use]
    pub fn malformed_id(value: impl Into<String>) -> Self {
        Self::MalformedId {
            value: value.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a malformed identifier.
    #[must_use]
    pub fn is_malformed_id(&self) -> bool {
        matches!(self, Self::MalformedId { .. })
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
