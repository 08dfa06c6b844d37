//! Backup run and per-repository record types.
//!
//! A [`BackupRun`] is the aggregate outcome of one end-to-end pipeline
//! invocation. It owns one [`RepositoryBackupRecord`] per discovered
//! repository, in discovery order, and is serialized to the run log
//! artifact at the end of the run. Runs are plain values threaded through
//! the orchestrator, never ambient state, so repeated runs in the same
//! process stay independent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Status of a whole backup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run is still processing repositories.
    #[default]
    InProgress,
    /// Every record finished with [`RecordStatus::Success`].
    Completed,
    /// At least one record finished with [`RecordStatus::Failed`].
    Partial,
}

impl RunStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single repository's backup.
///
/// Records start as `Failed` and move to `Success` exactly once, after
/// archive verification passes. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// The backup did not complete (initial state).
    #[default]
    Failed,
    /// Clone, checksum, archive, and verification all succeeded.
    Success,
}

impl RecordStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-repository outcome within a run.
///
/// Invariant: `status == Success` implies `checksum` is present,
/// `archive_path` is present, and the archive existed on disk with
/// `size_bytes > 0` at verification time. A failure anywhere in the
/// pipeline leaves the record `Failed` with whatever fields had been
/// populated up to that point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryBackupRecord {
    /// Repository name, unique within a run.
    pub name: String,
    /// Outcome of this repository's backup.
    pub status: RecordStatus,
    /// Hex-encoded tree fingerprint, if computed.
    pub checksum: Option<String>,
    /// Size of the produced archive in bytes; 0 if none was produced.
    pub size_bytes: u64,
    /// Location of the produced archive, if any.
    pub archive_path: Option<PathBuf>,
    /// Files skipped as unreadable during fingerprinting.
    ///
    /// The fingerprint is best-effort over readable files; this count
    /// makes the omission visible instead of silent.
    #[serde(default)]
    pub files_skipped: u64,
}

impl RepositoryBackupRecord {
    /// Creates a new record in its initial `Failed` state.
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self {
            name,
            status: RecordStatus::Failed,
            checksum: None,
            size_bytes: 0,
            archive_path: None,
            files_skipped: 0,
        }
    }
}

/// Aggregate success/failure counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of repositories discovered.
    pub total: usize,
    /// Records that reached `Success`.
    pub success: usize,
    /// Records that stayed `Failed`.
    pub failed: usize,
}

/// Aggregate outcome of one end-to-end backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRun {
    /// UTC timestamp fixed at run start.
    pub started_at: DateTime<Utc>,
    /// Opaque id derived from `started_at`, namespacing all run artifacts.
    pub run_id: String,
    /// Per-repository records in discovery order.
    #[serde(rename = "repositories")]
    pub records: Vec<RepositoryBackupRecord>,
    /// Terminal status once all records are processed.
    pub status: RunStatus,
    /// Free-text diagnostics accumulated across the run; never fatal.
    pub errors: Vec<String>,
    /// Summary counts, computed at finalization.
    pub summary: RunSummary,
}

impl BackupRun {
    /// Format used to derive `run_id` from the start timestamp.
    const RUN_ID_FORMAT: &'static str = "%Y%m%d_%H%M%S";

    /// Starts a new run stamped with the current UTC time.
    #[must_use]
    pub fn start() -> Self {
        Self::start_at(Utc::now())
    }

    /// Starts a new run stamped with an explicit time.
    #[must_use]
    pub fn start_at(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            run_id: started_at.format(Self::RUN_ID_FORMAT).to_string(),
            records: Vec::new(),
            status: RunStatus::InProgress,
            errors: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    /// Appends a diagnostic message.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Appends a finalized record.
    ///
    /// Records are frozen once appended; the orchestrator never mutates
    /// them afterwards.
    pub fn push_record(&mut self, record: RepositoryBackupRecord) {
        self.records.push(record);
    }

    /// Computes the terminal status and summary from the records.
    pub fn finalize(&mut self) {
        let total = self.records.len();
        let success = self
            .records
            .iter()
            .filter(|r| r.status == RecordStatus::Success)
            .count();

        self.summary = RunSummary {
            total,
            success,
            failed: total - success,
        };
        self.status = if success == total {
            RunStatus::Completed
        } else {
            RunStatus::Partial
        };
    }
}
