//! Configuration schema and environment loading.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

/// Default base directory, matching the daemon's historical default.
const DEFAULT_BASE_DIR: &str = "/var/lib/archives";

/// Default log output format label.
const DEFAULT_LOG_FORMAT: &str = "json";

const ENV_DATABASE_URL: &str = "TARMAC_DATABASE_URL";
const ENV_BASE_DIR: &str = "TARMAC_BASE_DIR";
const ENV_READ_ADDR: &str = "TARMAC_READ_ADDR";
const ENV_WRITE_ADDR: &str = "TARMAC_WRITE_ADDR";
const ENV_LOG_FORMAT: &str = "TARMAC_LOG_FORMAT";

/// Immutable startup configuration.
///
/// Read and write listeners bind independently; either may be omitted so a
/// deployment can split creation from serving, but at least one must be
/// present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres connection string for the record store.
    pub database_url: String,
    /// Directory under which archive payloads are created and served.
    pub base_dir: PathBuf,
    /// Bind address for the API that serves archives.
    pub read_addr: Option<SocketAddr>,
    /// Bind address for the API that creates archives.
    pub write_addr: Option<SocketAddr>,
    /// Log output format label (`json` or `pretty`); unknown labels fall
    /// back to `json` at telemetry installation.
    pub log_format: String,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when required variables are missing, an address
    /// fails to parse, or no listener is configured.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an injected variable lookup.
    ///
    /// # Errors
    ///
    /// Same conditions as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> ConfigResult<Self> {
        let database_url = lookup(ENV_DATABASE_URL).ok_or(ConfigError::MissingEnv {
            name: ENV_DATABASE_URL,
        })?;

        let base_dir = lookup(ENV_BASE_DIR).unwrap_or_else(|| DEFAULT_BASE_DIR.to_string());
        if base_dir.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_dir",
                reason: "empty",
                value: Some(base_dir),
            });
        }

        let config = Self {
            database_url,
            base_dir: PathBuf::from(base_dir),
            read_addr: parse_addr(ENV_READ_ADDR, lookup(ENV_READ_ADDR))?,
            write_addr: parse_addr(ENV_WRITE_ADDR, lookup(ENV_WRITE_ADDR))?,
            log_format: lookup(ENV_LOG_FORMAT)
                .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.read_addr.is_none() && self.write_addr.is_none() {
            return Err(ConfigError::Invalid {
                field: "listeners",
                reason: "none_configured",
                value: None,
            });
        }
        Ok(())
    }
}

fn parse_addr(name: &'static str, value: Option<String>) -> ConfigResult<Option<SocketAddr>> {
    value
        .map(|raw| {
            raw.parse().map_err(|source| ConfigError::InvalidAddr {
                name,
                value: raw,
                source,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(entries: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> = entries
            .iter()
            .map(|(name, value)| (*name, (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn loads_full_configuration() -> ConfigResult<()> {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "postgres://localhost/archives"),
            (ENV_BASE_DIR, "/srv/archives"),
            (ENV_READ_ADDR, "127.0.0.1:8080"),
            (ENV_WRITE_ADDR, "127.0.0.1:8081"),
            (ENV_LOG_FORMAT, "pretty"),
        ]))?;
        assert_eq!(config.database_url, "postgres://localhost/archives");
        assert_eq!(config.base_dir, PathBuf::from("/srv/archives"));
        assert!(config.read_addr.is_some());
        assert!(config.write_addr.is_some());
        assert_eq!(config.log_format, "pretty");
        Ok(())
    }

    #[test]
    fn base_dir_defaults_to_var_lib_archives() -> ConfigResult<()> {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "postgres://localhost/archives"),
            (ENV_WRITE_ADDR, "127.0.0.1:8081"),
        ]))?;
        assert_eq!(config.base_dir, PathBuf::from(DEFAULT_BASE_DIR));
        assert!(config.read_addr.is_none());
        assert_eq!(config.log_format, DEFAULT_LOG_FORMAT);
        Ok(())
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_READ_ADDR, "127.0.0.1:8080")]))
            .expect_err("database url is required");
        assert!(matches!(
            err,
            ConfigError::MissingEnv {
                name: ENV_DATABASE_URL
            }
        ));
    }

    #[test]
    fn at_least_one_listener_is_required() {
        let err = AppConfig::from_lookup(lookup(&[(
            ENV_DATABASE_URL,
            "postgres://localhost/archives",
        )]))
        .expect_err("listeners are required");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "listeners",
                reason: "none_configured",
                ..
            }
        ));
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            (ENV_DATABASE_URL, "postgres://localhost/archives"),
            (ENV_READ_ADDR, "nonsense"),
        ]))
        .expect_err("address must parse");
        assert!(matches!(
            err,
            ConfigError::InvalidAddr {
                name: ENV_READ_ADDR,
                ..
            }
        ));
    }
}
