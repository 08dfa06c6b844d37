//! Artifact publication service.
//!
//! Copies everything currently in the local backup store (archives plus
//! run logs) into `backups/{run_id}/` inside the durable sink working
//! copy, then stages, commits, and pushes through the
//! [`VersionControlSink`] capability. Publish failure never alters
//! backup success: the artifacts already exist locally.

use crate::config::VaultConfig;
use crate::provider::VersionControlSink;
use crate::store::BackupStore;
use crate::{Error, Result};
use std::fs;
use std::time::Instant;
use tracing::{info, instrument};

/// Publishes finished artifacts to the durable sink.
pub struct PublishService<S: VersionControlSink> {
    config: VaultConfig,
    sink: S,
}

impl<S: VersionControlSink> PublishService<S> {
    /// Creates a new publish service.
    #[must_use]
    pub const fn new(config: VaultConfig, sink: S) -> Self {
        Self { config, sink }
    }

    /// Publishes the store's artifacts under `backups/{run_id}/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy, stage, commit, or push fails.
    /// Callers treat this as a warning, not a backup failure.
    #[instrument(skip(self))]
    pub fn publish(&self, run_id: &str) -> Result<()> {
        let start = Instant::now();
        let result = self.publish_inner(run_id);

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("backup_publish_total", "status" => status.to_string()).increment(1);
        metrics::histogram!("backup_publish_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    fn publish_inner(&self, run_id: &str) -> Result<()> {
        let store = BackupStore::open(&self.config.backup_dir)?;
        let dest_dir = self.config.sink_path.join("backups").join(run_id);
        fs::create_dir_all(&dest_dir).map_err(|e| Error::OperationFailed {
            operation: "create_publish_dir".to_string(),
            cause: format!("{}: {e}", dest_dir.display()),
        })?;

        let mut copied = 0usize;
        for artifact in store.artifacts()? {
            let Some(file_name) = artifact.file_name() else {
                continue;
            };
            let dest = dest_dir.join(file_name);
            fs::copy(&artifact, &dest).map_err(|e| Error::OperationFailed {
                operation: "copy_artifact".to_string(),
                cause: format!("{}: {e}", artifact.display()),
            })?;
            copied += 1;
        }

        self.sink.stage_all(&self.config.sink_path)?;
        self.sink
            .commit(&self.config.sink_path, &format!("Automated backup {run_id}"))?;
        self.sink.push(&self.config.sink_path)?;

        info!(run_id, copied, "artifacts published to durable sink");
        Ok(())
    }
}
