//! In-memory record store for lifecycle tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tarmac_core::{ArchiveRecord, ArchiveUpdate, RecordStore, StoreError};

/// Mutex-backed [`RecordStore`] with switchable failure injection.
///
/// `fail_lookups` / `fail_updates` make the corresponding operations return
/// [`StoreError::Unavailable`], simulating a store outage without touching
/// stored state.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ArchiveRecord>>,
    fail_lookups: AtomicBool,
    fail_updates: AtomicBool,
    updates_applied: AtomicUsize,
}

impl MemoryStore {
    /// Empty store with no failure injection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle lookup failures.
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Toggle field-update failures.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of field-set updates that actually landed.
    #[must_use]
    pub fn updates_applied(&self) -> usize {
        self.updates_applied.load(Ordering::SeqCst)
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, ArchiveRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn unavailable(operation: &'static str) -> StoreError {
        StoreError::Unavailable {
            operation,
            source: Box::new(io::Error::other("injected store outage")),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: &ArchiveRecord) -> Result<(), StoreError> {
        self.guard().insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<ArchiveRecord, StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Self::unavailable("find_by_id"));
        }
        self.guard()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn update_fields(&self, id: &str, update: ArchiveUpdate) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Self::unavailable("update_fields"));
        }
        let mut guard = self.guard();
        let record = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        record.status = update.status;
        if let Some(log) = update.log {
            record.log = log;
        }
        record.updated_at = update.updated_at;
        drop(guard);
        self.updates_applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
