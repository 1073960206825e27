#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Startup configuration for the archive service.
//!
//! Configuration is read from the environment exactly once at boot and
//! passed by handle into the lifecycle manager and HTTP surfaces; nothing
//! reads ambient globals afterwards.

mod error;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::AppConfig;
