//! Record store contract consumed by the lifecycle manager.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use crate::model::{ArchiveRecord, ArchiveUpdate};

/// Boxed source error carried by infrastructure failures.
pub type StoreSource = Box<dyn Error + Send + Sync + 'static>;

/// Errors raised by a record store implementation.
///
/// `NotFound` and `Unavailable` are never conflated: a healthy store
/// answering "no such record" is not an infrastructure failure.
#[derive(Debug)]
pub enum StoreError {
    /// No record exists for the given id.
    NotFound {
        /// Identifier that missed.
        id: String,
    },
    /// The store could not be reached or the operation failed for reasons
    /// unrelated to the query itself.
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying store error.
        source: StoreSource,
    },
}

impl Display for StoreError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { .. } => formatter.write_str("archive record not found"),
            Self::Unavailable { .. } => formatter.write_str("record store unavailable"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Unavailable { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Durable key-value store of archive records, keyed by archive id.
///
/// Implementations must make a full [`ArchiveUpdate`] atomically visible: a
/// concurrent reader observes either none or all of its fields. No
/// read-modify-write or cross-record transaction is ever required.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a freshly created record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the insert fails.
    async fn insert(&self, record: &ArchiveRecord) -> Result<(), StoreError>;

    /// Point lookup by archive id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists for `id`, or
    /// [`StoreError::Unavailable`] when the store cannot answer.
    async fn find_by_id(&self, id: &str) -> Result<ArchiveRecord, StoreError>;

    /// Apply an unconditional field-set update to the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists for `id`, or
    /// [`StoreError::Unavailable`] when the update fails.
    async fn update_fields(&self, id: &str, update: ArchiveUpdate) -> Result<(), StoreError>;
}
