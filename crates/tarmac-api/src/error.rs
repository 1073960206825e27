//! # Design
//!
//! - Single crate-level error type for server bootstrap/serve failures.
//! - Constant messages; operational context in structured fields.
//! - Request-level failures never appear here; they map to HTTP responses.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::net::SocketAddr;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while binding or serving an API listener.
#[derive(Debug)]
pub enum ApiServerError {
    /// Binding the listener failed.
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Serving the API failed.
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Display for ApiServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { .. } => formatter.write_str("failed to bind api listener"),
            Self::Serve { .. } => formatter.write_str("api server terminated unexpectedly"),
        }
    }
}

impl Error for ApiServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::Serve { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn api_server_error_display_and_source() -> Result<(), Box<dyn Error>> {
        let bind = ApiServerError::Bind {
            addr: "127.0.0.1:8080".parse()?,
            source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
        };
        assert_eq!(bind.to_string(), "failed to bind api listener");
        assert!(bind.source().is_some());

        let serve = ApiServerError::Serve {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "lost"),
        };
        assert_eq!(serve.to_string(), "api server terminated unexpectedly");
        assert!(serve.source().is_some());
        Ok(())
    }
}
