//! Lifecycle operations: creation with detached population, lookup, and
//! destruction.

use std::fmt::{self, Debug, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{info, warn};

use crate::builder::{ArchiveBuilder, BuildOutcome, BuildRequest};
use crate::error::{LifecycleError, LifecycleResult};
use crate::model::{ARCHIVE_SUFFIX, ArchiveRecord, ArchiveStatus, ArchiveUpdate};
use crate::store::RecordStore;
use crate::token;

/// Byte stream persisted verbatim as an archive payload.
pub type UploadPayload = Box<dyn AsyncRead + Send + Unpin>;

/// Inputs accepted by [`LifecycleManager::create`].
pub enum NewArchive {
    /// Derive the archive from a source checkout and reference.
    Checkout {
        /// Working directory the archive is derived from.
        workdir: PathBuf,
        /// Commit-like reference to archive.
        refid: String,
        /// Optional path prefix applied inside the archive.
        prefix: Option<String>,
    },
    /// Persist an uploaded byte stream as the payload.
    Upload {
        /// Caller-supplied name; feeds token generation only.
        name: String,
        /// Payload bytes, copied fully into the archive file.
        payload: UploadPayload,
    },
}

impl Debug for NewArchive {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout {
                workdir,
                refid,
                prefix,
            } => formatter
                .debug_struct("Checkout")
                .field("workdir", workdir)
                .field("refid", refid)
                .field("prefix", prefix)
                .finish(),
            Self::Upload { name, .. } => formatter
                .debug_struct("Upload")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

impl NewArchive {
    fn discriminator(&self) -> String {
        match self {
            Self::Checkout { workdir, .. } => workdir.to_string_lossy().into_owned(),
            Self::Upload { name, .. } => name.clone(),
        }
    }
}

/// Owns the archive state machine: identifier allocation, background
/// population, and destruction.
///
/// The manager holds no in-process state per archive; every population task
/// coordinates with readers exclusively through the record store.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn RecordStore>,
    builder: Arc<dyn ArchiveBuilder>,
    base_dir: PathBuf,
}

impl LifecycleManager {
    /// Construct a manager over the given store, builder, and base
    /// directory for payload files.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        builder: Arc<dyn ArchiveBuilder>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            builder,
            base_dir: base_dir.into(),
        }
    }

    /// Create a new archive record and launch its population.
    ///
    /// Returns the inserted record with status [`ArchiveStatus::Building`]
    /// immediately; population runs as a detached task whose only output
    /// channel is the store. Exactly one population attempt runs per
    /// record, with no retry.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::TokenGeneration`] when the randomness
    /// source fails, or [`LifecycleError::Store`] when the insert fails. In
    /// both cases no background work has started.
    pub async fn create(&self, request: NewArchive) -> LifecycleResult<ArchiveRecord> {
        let id = token::generate(&request.discriminator());
        if id.is_empty() {
            return Err(LifecycleError::TokenGeneration);
        }

        let now = Utc::now();
        let record = ArchiveRecord {
            id: id.clone(),
            path: self.base_dir.join(format!("{id}{ARCHIVE_SUFFIX}")),
            status: ArchiveStatus::Building,
            log: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.store
            .insert(&record)
            .await
            .map_err(|source| LifecycleError::from_store("insert", source))?;

        info!(archive_id = %record.id, path = %record.path.display(), "archive created");

        let store = Arc::clone(&self.store);
        let builder = Arc::clone(&self.builder);
        let path = record.path.clone();
        tokio::spawn(async move {
            populate(store, builder, id, path, request).await;
        });

        Ok(record)
    }

    /// Fetch the current record for `id`.
    ///
    /// Destroyed records are returned as-is; the tombstone is visible so
    /// callers can distinguish "consumed" from "never existed".
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when no record exists, or
    /// [`LifecycleError::Store`] when the store cannot answer.
    pub async fn get(&self, id: &str) -> LifecycleResult<ArchiveRecord> {
        self.store
            .find_by_id(id)
            .await
            .map_err(|source| LifecycleError::from_store("find_by_id", source))
    }

    /// Tombstone the record and remove its payload file.
    ///
    /// Terminal records are left untouched: a repeated destroy is a no-op
    /// and an errored archive keeps its diagnostics and any partial payload.
    /// For the rest, the status update strictly precedes file removal: when
    /// removal fails the record is already [`ArchiveStatus::Destroyed`] and
    /// the payload is orphaned on disk. The record itself is never deleted.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when no record exists,
    /// [`LifecycleError::Store`] when the lookup or update fails, or
    /// [`LifecycleError::RemoveFile`] when the payload cannot be removed.
    pub async fn destroy(&self, id: &str) -> LifecycleResult<()> {
        let record = self.get(id).await?;
        if record.status.is_terminal() {
            return Ok(());
        }
        self.store
            .update_fields(
                id,
                ArchiveUpdate {
                    status: ArchiveStatus::Destroyed,
                    log: None,
                    updated_at: Utc::now(),
                },
            )
            .await
            .map_err(|source| LifecycleError::from_store("update_fields", source))?;

        info!(archive_id = %id, "archive destroyed");

        match tokio::fs::remove_file(&record.path).await {
            Ok(()) => Ok(()),
            // An already-absent payload is fine: nothing guarantees the
            // builder ever wrote the file before the record was destroyed.
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LifecycleError::RemoveFile {
                path: record.path,
                source,
            }),
        }
    }
}

/// Detached population task; the single writer that moves a record out of
/// `Building`, at most once.
async fn populate(
    store: Arc<dyn RecordStore>,
    builder: Arc<dyn ArchiveBuilder>,
    id: String,
    path: PathBuf,
    request: NewArchive,
) {
    let outcome = match request {
        NewArchive::Checkout {
            workdir,
            refid,
            prefix,
        } => {
            builder
                .build(&BuildRequest {
                    workdir,
                    refid,
                    prefix,
                    output: path,
                })
                .await
        }
        NewArchive::Upload { payload, .. } => write_payload(&path, payload).await,
    };

    let status = if outcome.success {
        ArchiveStatus::Ready
    } else {
        ArchiveStatus::Error
    };
    info!(archive_id = %id, status = %status, "archive population settled");

    let update = ArchiveUpdate {
        status,
        log: Some(outcome.log),
        updated_at: Utc::now(),
    };
    if let Err(err) = store.update_fields(&id, update).await {
        // No caller is waiting and there is no retry; the record stays in
        // `Building`, which readers must treat as an observable stuck state.
        warn!(archive_id = %id, error = %err, "failed to persist population outcome");
    }
}

/// Copy an uploaded stream into the payload file.
async fn write_payload(path: &Path, mut payload: UploadPayload) -> BuildOutcome {
    let mut file = match tokio::fs::File::create(path).await {
        Ok(file) => file,
        Err(err) => {
            return BuildOutcome::failed(format!(
                "failed to open archive payload {}: {err}",
                path.display()
            ));
        }
    };

    if let Err(err) = tokio::io::copy(&mut payload, &mut file).await {
        return BuildOutcome::failed(format!(
            "failed to write archive payload {}: {err}",
            path.display()
        ));
    }
    if let Err(err) = file.shutdown().await {
        return BuildOutcome::failed(format!(
            "failed to flush archive payload {}: {err}",
            path.display()
        ));
    }

    BuildOutcome::succeeded(String::new())
}
