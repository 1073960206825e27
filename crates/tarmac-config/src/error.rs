//! # Design
//!
//! - Constant error messages; the offending field and value live in
//!   structured context.
//! - Validation failures carry machine-readable reasons for tests.

use std::net::AddrParseError;

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: &'static str,
    },
    /// A bind address could not be parsed.
    #[error("invalid bind address")]
    InvalidAddr {
        /// Environment variable that held the address.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Underlying parse error.
        source: AddrParseError,
    },
    /// A configuration value failed validation.
    #[error("invalid configuration")]
    Invalid {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}
