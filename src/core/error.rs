//! Error types for the stego ledger
//!
//! This module defines the error types used throughout the library. A
//! duplicate content hash is not an error: it is surfaced to the caller as a
//! decision request (see [`crate::ledger::DuplicatePolicy`]).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the stego ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No MIME type or image format could be determined for the input
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Hex or data URI input does not decode to a valid structure
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A persisted ledger document does not parse as the expected structure
    #[error("Corrupt ledger '{}': {message}", path.display())]
    CorruptStore { path: PathBuf, message: String },

    /// The carrier image does not contain an embedded payload
    #[error("No embedded payload found in carrier image")]
    NoPayloadFound,

    /// The payload does not fit into the cover image
    #[error("Payload of {needed} bytes exceeds carrier capacity of {capacity} bytes")]
    PayloadTooLarge { needed: usize, capacity: usize },

    /// Stat bounds were malformed
    #[error("Invalid stats range: {0}")]
    RangeInvalid(String),

    /// Every candidate file name within the attempt bound is taken
    #[error("No free file name for '{base}' after {attempts} attempts")]
    NameSpaceExhausted { base: String, attempts: u32 },

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    ImageError(String),

    /// General I/O error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::IoError(err.to_string())
    }
}

impl From<image::ImageError> for LedgerError {
    fn from(err: image::ImageError) -> Self {
        LedgerError::ImageError(err.to_string())
    }
}

impl LedgerError {
    /// Build a [`LedgerError::CorruptStore`] for the given document
    pub fn corrupt(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        LedgerError::CorruptStore {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
