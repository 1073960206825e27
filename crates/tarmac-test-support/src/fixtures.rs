//! Test fixtures and environment helpers.

use std::process::Command;

use tempfile::TempDir;

/// Returns `true` if a `git` binary is reachable for builder tests.
#[must_use]
pub fn git_available() -> bool {
    Command::new("git")
        .args(["--version"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Temporary base directory for archive payloads.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn temp_base_dir() -> std::io::Result<TempDir> {
    tempfile::Builder::new().prefix("tarmac-").tempdir()
}
