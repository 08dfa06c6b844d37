//! Data models for repovault.
//!
//! This module contains the core data structures used throughout the
//! backup pipeline.

mod run;

pub use run::{BackupRun, RecordStatus, RepositoryBackupRecord, RunStatus, RunSummary};
