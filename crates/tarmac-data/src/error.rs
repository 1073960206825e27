//! Failures raised below the [`tarmac_core::RecordStore`] seam.
//!
//! Everything here surfaces to the core wrapped in
//! `StoreError::Unavailable`, except migration failures, which abort
//! startup before any store exists.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised while talking to the archive database.
#[derive(Debug)]
pub enum DataError {
    /// Applying embedded schema migrations failed at startup.
    Migration {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A query against the archives table failed.
    Query {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// An archive path could not be stored as a text column.
    PathEncoding {
        /// Path that is not valid UTF-8.
        path: PathBuf,
    },
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Migration { .. } => "schema migration failed",
            Self::Query { .. } => "archive query failed",
            Self::PathEncoding { .. } => "archive path is not valid utf-8",
        };
        formatter.write_str(message)
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Migration { source } => Some(source),
            Self::Query { source, .. } => Some(source),
            Self::PathEncoding { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_stay_constant_across_contexts() {
        let queries = [
            DataError::Query {
                operation: "insert",
                source: sqlx::Error::PoolTimedOut,
            },
            DataError::Query {
                operation: "find_by_id",
                source: sqlx::Error::RowNotFound,
            },
        ];
        for query in queries {
            assert_eq!(query.to_string(), "archive query failed");
            assert!(query.source().is_some());
        }
    }

    #[test]
    fn path_encoding_carries_no_source() {
        let err = DataError::PathEncoding {
            path: PathBuf::from("/var/lib/archives"),
        };
        assert_eq!(err.to_string(), "archive path is not valid utf-8");
        assert!(err.source().is_none());
    }

    #[test]
    fn migration_failures_preserve_the_cause() {
        let err = DataError::Migration {
            source: sqlx::migrate::MigrateError::VersionMissing(1),
        };
        assert_eq!(err.to_string(), "schema migration failed");
        assert!(err.source().is_some());
    }
}
