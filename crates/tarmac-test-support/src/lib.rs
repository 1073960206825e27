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

//! Shared test helpers used across integration suites.
//! Layout: `memory.rs` (in-memory record store with failure injection),
//! `builders.rs` (scripted archive builders), `fixtures.rs` (env/dir helpers).

pub mod builders;
pub mod fixtures;
pub mod memory;

pub use builders::{RecordingBuilder, StaticBuilder};
pub use memory::MemoryStore;
