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

//! Archive lifecycle manager: record model, token generation, creation with
//! asynchronous population, lookup, and destruction.
//!
//! Layout: `model.rs` (record and status), `token.rs` (identifier
//! generation), `store.rs` (record store contract), `builder.rs` (archive
//! builder contract and git implementation), `manager.rs` (lifecycle
//! operations).

pub mod builder;
pub mod error;
pub mod manager;
pub mod model;
pub mod store;
pub mod token;

pub use builder::{ArchiveBuilder, BuildOutcome, BuildRequest, GitArchiveBuilder};
pub use error::{LifecycleError, LifecycleResult};
pub use manager::{LifecycleManager, NewArchive, UploadPayload};
pub use model::{ArchiveRecord, ArchiveStatus, ArchiveUpdate};
pub use store::{RecordStore, StoreError};
