//! Postgres implementation of the archive record store.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;

use tarmac_core::{ArchiveRecord, ArchiveStatus, ArchiveUpdate, RecordStore, StoreError};

use crate::error::{DataError, Result};

const INSERT_ARCHIVE: &str = r"
    INSERT INTO archives (id, path, status, log, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6)
";

const SELECT_ARCHIVE: &str = r"
    SELECT id, path, status, log, created_at, updated_at
    FROM archives
    WHERE id = $1
";

const UPDATE_ARCHIVE: &str = r"
    UPDATE archives
    SET status = $2,
        log = COALESCE($3, log),
        updated_at = $4
    WHERE id = $1
";

/// Database-backed repository for archive records.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Initialise the store, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail or the database is unreachable.
    pub async fn new(pool: PgPool) -> Result<Self> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator
            .run(&pool)
            .await
            .map_err(|source| DataError::Migration { source })?;
        Ok(Self { pool })
    }
}

fn unavailable(operation: &'static str, source: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        operation,
        source: Box::new(DataError::Query { operation, source }),
    }
}

fn decode_record(operation: &'static str, row: &PgRow) -> std::result::Result<ArchiveRecord, StoreError> {
    let path: String = row
        .try_get("path")
        .map_err(|source| unavailable(operation, source))?;
    let status_code: i16 = row
        .try_get("status")
        .map_err(|source| unavailable(operation, source))?;
    Ok(ArchiveRecord {
        id: row
            .try_get("id")
            .map_err(|source| unavailable(operation, source))?,
        path: PathBuf::from(path),
        status: ArchiveStatus::from_code(status_code),
        log: row
            .try_get("log")
            .map_err(|source| unavailable(operation, source))?,
        created_at: row
            .try_get("created_at")
            .map_err(|source| unavailable(operation, source))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|source| unavailable(operation, source))?,
    })
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert(&self, record: &ArchiveRecord) -> std::result::Result<(), StoreError> {
        let path = record.path.to_str().ok_or_else(|| StoreError::Unavailable {
            operation: "insert",
            source: Box::new(DataError::PathEncoding {
                path: record.path.clone(),
            }),
        })?;

        sqlx::query(INSERT_ARCHIVE)
            .bind(&record.id)
            .bind(path)
            .bind(record.status.code())
            .bind(&record.log)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|source| unavailable("insert", source))?;

        debug!(archive_id = %record.id, "archive record inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> std::result::Result<ArchiveRecord, StoreError> {
        let row = sqlx::query(SELECT_ARCHIVE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| unavailable("find_by_id", source))?;

        row.map_or_else(
            || Err(StoreError::NotFound { id: id.to_string() }),
            |row| decode_record("find_by_id", &row),
        )
    }

    async fn update_fields(
        &self,
        id: &str,
        update: ArchiveUpdate,
    ) -> std::result::Result<(), StoreError> {
        let result = sqlx::query(UPDATE_ARCHIVE)
            .bind(id)
            .bind(update.status.code())
            .bind(update.log)
            .bind(update.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|source| unavailable("update_fields", source))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
