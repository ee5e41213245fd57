// models/src/errors.rs

use std::io;
pub use thiserror::Error;
use anyhow::Error as AnyhowError;
#[cfg(feature = "bincode-errors")]
use bincode::error::{DecodeError, EncodeError};

#[derive(Debug, Error)]
pub enum TriageError {
    /// No classifier artifact is loaded. Operational state, not a per-record error.
    #[error("Model not loaded: {0}")]
    ModelUnavailable(String),
    /// The artifact's declared feature lists or class ids are inconsistent.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Malformed field '{field}': {reason}")]
    MalformedField { field: String, reason: String },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Persistence update failed: {0}")]
    PersistenceUpdate(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Training error: {0}")]
    TrainingError(String),
    #[error("Invalid data provided: {0}")]
    InvalidData(String),
    #[error("An internal error occurred: {0}")]
    InternalError(String),
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[cfg(feature = "sled-errors")]
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[cfg(feature = "bincode-errors")]
    #[error(transparent)]
    BincodeDecode(#[from] DecodeError),
    #[cfg(feature = "bincode-errors")]
    #[error(transparent)]
    BincodeEncode(#[from] EncodeError),
}

impl TriageError {
    /// True for errors that mean the model/schema contract itself is broken.
    pub fn is_contract_failure(&self) -> bool {
        matches!(self, TriageError::ModelUnavailable(_) | TriageError::SchemaMismatch(_))
    }
}

#[cfg(feature = "config-errors")]
impl From<config::ConfigError> for TriageError {
    fn from(err: config::ConfigError) -> Self {
        TriageError::ConfigError(err.to_string())
    }
}

#[cfg(feature = "tokio-errors")]
impl From<tokio::time::error::Elapsed> for TriageError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        TriageError::Timeout(err.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::SerializationError(format!("JSON processing error: {}", err))
    }
}

impl From<AnyhowError> for TriageError {
    fn from(err: AnyhowError) -> Self {
        TriageError::InternalError(format!("{:#}", err))
    }
}

/// A validation error.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// An identifier has an invalid length.
    #[error("identifier has invalid length")]
    InvalidIdentifierLength,
    /// An identifier is invalid (e.g., contains control characters).
    #[error("identifier '{0}' is invalid")]
    InvalidIdentifier(String),
    /// A threshold or probability outside of [0, 1].
    #[error("value {0} for {1} is outside [0, 1]")]
    OutOfUnitRange(f64, String),
    /// A feature name declared twice, or declared both numeric and categorical.
    #[error("feature '{0}' is declared more than once")]
    DuplicateFeature(String),
}

/// A type alias for a `Result` that returns a `TriageError` on failure.
pub type TriageResult<T> = Result<T, TriageError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
