//! # Repovault
//!
//! Scheduled, verifiable backups for a fleet of remote source-code
//! repositories.
//!
//! Repovault enumerates an organization's repositories, snapshots each into
//! an isolated workspace, fingerprints the tree contents, packages the
//! snapshot as a compressed archive, verifies the result, prunes archives
//! past the retention window, and publishes finished artifacts to a durable
//! version-controlled sink.
//!
//! ## Features
//!
//! - Per-repository failure isolation: one failed clone never aborts a run
//! - Deterministic SHA-256 tree fingerprints, stable across filesystems
//! - Archive verification before a backup is counted as a success
//! - Age-based retention pruning of the local backup store
//! - Publication of archives and run logs to a git-backed durable sink
//!
//! ## Example
//!
//! ```rust,ignore
//! use repovault::{BackupService, GhCliProvider, VaultConfig};
//!
//! let config = VaultConfig::load_default();
//! let service = BackupService::new(config, GhCliProvider::new());
//! let run = service.run()?;
//! println!("{} of {} repositories backed up", run.summary.success, run.summary.total);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod archive;
pub mod checksum;
pub mod config;
pub mod models;
pub mod observability;
pub mod provider;
pub mod retention;
pub mod services;
pub mod store;

// Re-exports for convenience
pub use archive::Archiver;
pub use checksum::{TreeFingerprint, fingerprint};
pub use config::VaultConfig;
pub use models::{BackupRun, RecordStatus, RepositoryBackupRecord, RunStatus, RunSummary};
pub use provider::{GhCliProvider, GitWorkingCopySink, SourceControlProvider, VersionControlSink};
pub use retention::RetentionManager;
pub use services::{BackupProgress, BackupService, PublishService, RepositoryEnumerator, SnapshotFetcher};
pub use store::BackupStore;

/// Error type for repovault operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations. Pipeline failures (fetch, verification, retention,
/// publish) are deliberately *not* variants here: the pipeline converts
/// them into record statuses and run diagnostics at the boundary where
/// they occur, so `Error` only covers faults a caller can meaningfully
/// propagate.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A repository name contains path separators or parent references
    /// - A run id fails validation before being used in a path
    /// - Configuration values are malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - The `gh` CLI exits non-zero or cannot be spawned
    /// - git operations on the durable sink fail
    /// - Archive packaging fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for repovault operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized utility to avoid duplicate implementations across the
/// codebase. Uses `SystemTime::now()` with fallback to 0 if the system
/// clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("bad repo name".to_string());
        assert_eq!(err.to_string(), "invalid input: bad repo name");

        let err = Error::OperationFailed {
            operation: "clone".to_string(),
            cause: "network unreachable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'clone' failed: network unreachable"
        );
    }

    #[test]
    fn test_current_timestamp_is_reasonable() {
        // 2020-01-01 as a floor
        assert!(current_timestamp() > 1_577_836_800);
    }
}
