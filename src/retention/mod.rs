//! Retention pruning for the local backup store.
//!
//! Deletes archive artifacts whose last-modified time is older than the
//! configured retention window. The pass operates on the entire store,
//! not just the current run, so archives from earlier runs age out too.
//! Deletion failures for individual files are reported and skipped.

use crate::store::BackupStore;
use crate::{current_timestamp, Result};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing::{info, instrument, warn};

/// Seconds per day, for the age threshold.
const SECONDS_PER_DAY: u64 = 86_400;

/// Outcome of one retention pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Archives examined.
    pub examined: usize,
    /// Archives deleted.
    pub removed: Vec<PathBuf>,
    /// Archives that could not be deleted.
    pub failed: usize,
}

/// Prunes stale archives from the local backup store.
pub struct RetentionManager {
    store: BackupStore,
    retention_days: u32,
}

impl RetentionManager {
    /// Creates a retention manager over an open store.
    #[must_use]
    pub const fn new(store: BackupStore, retention_days: u32) -> Self {
        Self {
            store,
            retention_days,
        }
    }

    /// Deletes every archive older than the retention window.
    ///
    /// An archive is stale iff `now - mtime > retention_days * 86400`
    /// seconds. Artifacts whose mtime cannot be read are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be listed;
    /// per-file failures are counted in [`PruneStats::failed`].
    #[instrument(skip(self), fields(retention_days = self.retention_days))]
    pub fn prune(&self) -> Result<PruneStats> {
        let cutoff =
            current_timestamp().saturating_sub(u64::from(self.retention_days) * SECONDS_PER_DAY);
        let mut stats = PruneStats::default();

        for archive in self.store.archives()? {
            stats.examined += 1;

            let mtime = std::fs::metadata(&archive)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs());
            let Some(mtime) = mtime else {
                warn!(archive = %archive.display(), "could not read mtime; keeping");
                continue;
            };

            if mtime >= cutoff {
                continue;
            }
            match std::fs::remove_file(&archive) {
                Ok(()) => {
                    info!(archive = %archive.display(), "removed stale archive");
                    stats.removed.push(archive);
                }
                Err(e) => {
                    warn!(archive = %archive.display(), error = %e, "failed to remove archive");
                    stats.failed += 1;
                }
            }
        }

        metrics::counter!("backup_archives_pruned_total")
            .increment(stats.removed.len() as u64);
        Ok(stats)
    }
}
