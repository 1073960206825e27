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

//! HTTP surfaces over the archive lifecycle manager.
//!
//! Two independent routers mirror the daemon's split deployment: the write
//! API creates archives (from a checkout or an uploaded stream) and the
//! read API serves each archive once, destroying it after delivery unless
//! the caller opts out. Neither router holds lifecycle logic; both call
//! into [`tarmac_core::LifecycleManager`].

mod error;
mod handlers;
mod router;

pub use error::{ApiServerError, ApiServerResult};
pub use router::ApiServer;
