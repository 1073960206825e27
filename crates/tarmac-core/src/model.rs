//! Persisted archive record and its lifecycle status.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filename suffix appended to every archive payload.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Lifecycle state of an archive.
///
/// Persisted as a small integer code; codes outside the known range decode
/// to [`ArchiveStatus::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStatus {
    /// Population is in flight; the payload may be partially written.
    Building,
    /// Population succeeded; the payload is complete and servable.
    Ready,
    /// Population failed; the log carries the failure detail.
    Error,
    /// The archive was consumed; the record remains as a tombstone.
    Destroyed,
    /// A stored code this build does not recognise.
    Unknown,
}

impl ArchiveStatus {
    /// Stable lowercase label for logs and HTTP payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Destroyed => "destroyed",
            Self::Unknown => "unknown",
        }
    }

    /// Integer code used by the record store.
    ///
    /// [`ArchiveStatus::Unknown`] has no stable code and is never written
    /// back; it maps to `-1` so a round-trip stays out of the known range.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Building => 0,
            Self::Ready => 1,
            Self::Error => 2,
            Self::Destroyed => 3,
            Self::Unknown => -1,
        }
    }

    /// Decode a stored status code.
    #[must_use]
    pub const fn from_code(code: i16) -> Self {
        match code {
            0 => Self::Building,
            1 => Self::Ready,
            2 => Self::Error,
            3 => Self::Destroyed,
            _ => Self::Unknown,
        }
    }

    /// Whether the status admits no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::Destroyed)
    }
}

impl Display for ArchiveStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Durable metadata describing one archive.
///
/// `id` and `path` are fixed at creation; `status`, `log`, and `updated_at`
/// are mutated exactly once by population and at most once more by
/// destruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Unguessable hex token assigned at creation.
    pub id: String,
    /// Filesystem location of the payload.
    pub path: PathBuf,
    /// Current lifecycle state.
    pub status: ArchiveStatus,
    /// Diagnostics captured during population; empty until settlement.
    pub log: String,
    /// Insertion timestamp; never changes.
    pub created_at: DateTime<Utc>,
    /// Bumped on every status-affecting mutation.
    pub updated_at: DateTime<Utc>,
}

/// Atomic field-set update applied to a record by id.
///
/// A reader never observes a partially-applied update; the store flips all
/// fields in one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUpdate {
    /// New lifecycle state.
    pub status: ArchiveStatus,
    /// Replacement log text; `None` leaves the stored log untouched.
    pub log: Option<String>,
    /// New modification timestamp.
    pub updated_at: DateTime<Utc>,
}
