//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for
//!   debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: tarmac_config::ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("telemetry initialisation failed")]
    Telemetry {
        /// Failure description.
        detail: String,
    },
    /// Database connectivity failed.
    #[error("database operation failed")]
    Database {
        /// Operation identifier.
        operation: &'static str,
        /// Source database error.
        source: sqlx::Error,
    },
    /// Record store initialisation failed.
    #[error("record store initialisation failed")]
    Data {
        /// Operation identifier.
        operation: &'static str,
        /// Source data error.
        source: tarmac_data::DataError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: tarmac_api::ApiServerError,
    },
    /// Filesystem preparation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the operation.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A server task ended abnormally.
    #[error("background task failed")]
    Task {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}
