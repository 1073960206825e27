//! Archive builder contract and the `git archive` implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Immutable inputs handed to an [`ArchiveBuilder`] for one population run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Working directory the archive is derived from.
    pub workdir: PathBuf,
    /// Commit-like reference to archive.
    pub refid: String,
    /// Optional path prefix applied inside the archive.
    pub prefix: Option<String>,
    /// Destination file for the compressed tar stream.
    pub output: PathBuf,
}

impl BuildRequest {
    /// Prefix normalised to always end with a path separator.
    #[must_use]
    pub fn normalized_prefix(&self) -> Option<String> {
        self.prefix.as_ref().map(|prefix| {
            if prefix.ends_with('/') {
                prefix.clone()
            } else {
                format!("{prefix}/")
            }
        })
    }
}

/// Result of one build attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Whether the underlying operation succeeded.
    pub success: bool,
    /// Combined diagnostics captured regardless of outcome; may be empty.
    pub log: String,
}

impl BuildOutcome {
    /// Successful outcome with the captured diagnostics.
    #[must_use]
    pub const fn succeeded(log: String) -> Self {
        Self { success: true, log }
    }

    /// Failed outcome with the failure detail as diagnostics.
    #[must_use]
    pub const fn failed(log: String) -> Self {
        Self {
            success: false,
            log,
        }
    }
}

/// Produces a compressed archive file from a source checkout.
///
/// Builders never raise: a failure to even launch the underlying operation
/// is reported as a failed [`BuildOutcome`] with the error text as
/// diagnostics, so population always settles.
#[async_trait]
pub trait ArchiveBuilder: Send + Sync {
    /// Run one build attempt.
    async fn build(&self, request: &BuildRequest) -> BuildOutcome;
}

/// Builder that shells out to `git archive --format=tar.gz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitArchiveBuilder;

#[async_trait]
impl ArchiveBuilder for GitArchiveBuilder {
    async fn build(&self, request: &BuildRequest) -> BuildOutcome {
        let mut command = Command::new("git");
        command
            .arg("archive")
            .arg("--format=tar.gz")
            .current_dir(&request.workdir);
        if let Some(prefix) = request.normalized_prefix() {
            command.arg(format!("--prefix={prefix}"));
        }
        command.arg("-o").arg(&request.output).arg(&request.refid);

        debug!(
            workdir = %request.workdir.display(),
            refid = %request.refid,
            output = %request.output.display(),
            "invoking git archive"
        );

        match command.output().await {
            Ok(output) => {
                let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
                log.push_str(&String::from_utf8_lossy(&output.stderr));
                if output.status.success() {
                    BuildOutcome::succeeded(log)
                } else {
                    BuildOutcome::failed(log)
                }
            }
            Err(err) => BuildOutcome::failed(format!("failed to launch git archive: {err}")),
        }
    }
}
