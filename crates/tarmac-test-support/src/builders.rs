//! Scripted archive builders for lifecycle tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tarmac_core::{ArchiveBuilder, BuildOutcome, BuildRequest};

/// Builder that always returns the same outcome.
///
/// With `touch_output` set, a successful build also writes a placeholder
/// payload file so destruction tests have something to remove.
pub struct StaticBuilder {
    success: bool,
    log: String,
    touch_output: bool,
}

impl StaticBuilder {
    /// Builder that succeeds with the given diagnostics.
    #[must_use]
    pub fn succeeding(log: impl Into<String>) -> Self {
        Self {
            success: true,
            log: log.into(),
            touch_output: true,
        }
    }

    /// Builder that fails with the given diagnostics.
    #[must_use]
    pub fn failing(log: impl Into<String>) -> Self {
        Self {
            success: false,
            log: log.into(),
            touch_output: false,
        }
    }

    /// Disable payload file creation on success.
    #[must_use]
    pub const fn without_output(mut self) -> Self {
        self.touch_output = false;
        self
    }
}

#[async_trait]
impl ArchiveBuilder for StaticBuilder {
    async fn build(&self, request: &BuildRequest) -> BuildOutcome {
        if self.success {
            if self.touch_output {
                tokio::fs::write(&request.output, b"scripted archive payload")
                    .await
                    .map_or_else(
                        |err| BuildOutcome::failed(err.to_string()),
                        |()| BuildOutcome::succeeded(self.log.clone()),
                    )
            } else {
                BuildOutcome::succeeded(self.log.clone())
            }
        } else {
            BuildOutcome::failed(self.log.clone())
        }
    }
}

/// Builder that records the request it received and succeeds silently.
#[derive(Default)]
pub struct RecordingBuilder {
    seen: Mutex<Option<BuildRequest>>,
}

impl RecordingBuilder {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last request handed to [`ArchiveBuilder::build`], if any.
    #[must_use]
    pub fn last_request(&self) -> Option<BuildRequest> {
        self.guard().clone()
    }

    fn guard(&self) -> MutexGuard<'_, Option<BuildRequest>> {
        match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ArchiveBuilder for RecordingBuilder {
    async fn build(&self, request: &BuildRequest) -> BuildOutcome {
        *self.guard() = Some(request.clone());
        BuildOutcome::succeeded(String::new())
    }
}
