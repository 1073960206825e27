//! # Design
//!
//! - One crate-level error type for synchronous lifecycle operations.
//! - Constant messages; operational context lives in structured fields.
//! - Asynchronous population failures are never surfaced here: they settle
//!   into the record's status and log instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Result alias for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors raised by the synchronous lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The OS randomness source failed while generating an archive token.
    #[error("archive token generation failed")]
    TokenGeneration,
    /// No record exists for the given id.
    #[error("archive not found")]
    NotFound {
        /// Identifier that missed.
        id: String,
    },
    /// The record store failed for reasons unrelated to the query.
    #[error("record store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying store error.
        source: StoreError,
    },
    /// The payload file could not be removed after a destroy.
    ///
    /// The status update has already landed when this is returned; the file
    /// is orphaned on disk.
    #[error("payload removal failed")]
    RemoveFile {
        /// Payload path that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl LifecycleError {
    pub(crate) fn from_store(operation: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound { id } => Self::NotFound { id },
            source @ StoreError::Unavailable { .. } => Self::Store { operation, source },
        }
    }
}
