//! Backup orchestration service.
//!
//! Sequences per-repository work: isolated clone, tree fingerprint,
//! archive packaging, and verification, aggregating one record per
//! repository into a [`BackupRun`]. Per-repository failure isolation is
//! the central reliability property: a fault anywhere in one
//! repository's pipeline finalizes that record as `Failed` and the loop
//! moves on.

use crate::archive::{self, Archiver};
use crate::checksum;
use crate::config::VaultConfig;
use crate::models::{BackupRun, RecordStatus, RepositoryBackupRecord};
use crate::provider::SourceControlProvider;
use crate::services::{RepositoryEnumerator, SnapshotFetcher};
use crate::store::BackupStore;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Progress notification emitted by [`BackupService::run_with_observer`].
///
/// `Started` fires before any work happens for the repository, so a
/// consumer can show a progress line while a long clone runs; `Finished`
/// carries the finalized record.
pub enum BackupProgress<'a> {
    /// A repository's pipeline is about to start.
    Started {
        /// The repository name.
        name: &'a str,
    },
    /// A repository's record was finalized.
    Finished(&'a RepositoryBackupRecord),
}

/// Orchestrates one end-to-end backup run.
pub struct BackupService<P: SourceControlProvider> {
    config: VaultConfig,
    provider: P,
}

impl<P: SourceControlProvider> BackupService<P> {
    /// Creates a new backup service.
    #[must_use]
    pub const fn new(config: VaultConfig, provider: P) -> Self {
        Self { config, provider }
    }

    /// Runs the pipeline over the whole fleet.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local backup store cannot be
    /// created. Everything downstream (enumeration, clone, checksum,
    /// archive, verification) is converted into record statuses and run
    /// diagnostics instead of propagating.
    pub fn run(&self) -> Result<BackupRun> {
        self.run_with_observer(|_| {})
    }

    /// Runs the pipeline, invoking `observer` as each repository starts
    /// and finishes. Used by the CLI for per-repository progress lines.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::run`].
    #[instrument(skip_all, fields(organization = %self.config.organization))]
    pub fn run_with_observer<F>(&self, mut observer: F) -> Result<BackupRun>
    where
        F: FnMut(BackupProgress<'_>),
    {
        let start = Instant::now();
        let store = BackupStore::open(&self.config.backup_dir)?;
        let mut run = BackupRun::start();

        let enumerator = RepositoryEnumerator::new(&self.provider, &self.config);
        let names = enumerator.list(&mut run.errors);
        if names.is_empty() {
            warn!("no repositories discovered");
        }
        info!(run_id = %run.run_id, total = names.len(), "backup run started");

        let fetcher = SnapshotFetcher::new(&self.provider, self.config.organization.clone());
        let archiver = Archiver::new(store.root());

        for name in names {
            observer(BackupProgress::Started { name: &name });
            let record =
                self.backup_repository(&store, &fetcher, &archiver, &run.run_id, &name, &mut run.errors);

            let status = record.status.as_str();
            metrics::counter!("repository_backup_total", "status" => status.to_string())
                .increment(1);
            observer(BackupProgress::Finished(&record));
            run.push_record(record);
        }

        run.finalize();
        metrics::histogram!("backup_run_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        info!(
            run_id = %run.run_id,
            status = %run.status,
            total = run.summary.total,
            success = run.summary.success,
            failed = run.summary.failed,
            "backup run finished"
        );

        Ok(run)
    }

    /// Backs up a single repository, always returning a finalized record.
    fn backup_repository(
        &self,
        store: &BackupStore,
        fetcher: &SnapshotFetcher<'_, P>,
        archiver: &Archiver,
        run_id: &str,
        name: &str,
        errors: &mut Vec<String>,
    ) -> RepositoryBackupRecord {
        let mut record = RepositoryBackupRecord::new(name.to_string());

        let workspace = match store.workspace_for(name) {
            Ok(workspace) => workspace,
            Err(e) => {
                errors.push(format!("Backup failed for {name}: {e}"));
                return record;
            }
        };

        let outcome = self.snapshot_into(fetcher, archiver, run_id, &workspace, &mut record, errors);
        if let Err(e) = outcome {
            errors.push(format!("Backup failed for {name}: {e}"));
        }

        // The workspace is released on every exit path, success or not.
        if workspace.exists() {
            if let Err(e) = fs::remove_dir_all(&workspace) {
                warn!(repository = %name, error = %e, "failed to remove workspace");
            }
        }

        record
    }

    /// Steps 2-5 of the per-repository pipeline: fetch, fingerprint,
    /// package, verify. Mutates the record as fields become available so
    /// a later failure still leaves earlier observations in the run log.
    fn snapshot_into(
        &self,
        fetcher: &SnapshotFetcher<'_, P>,
        archiver: &Archiver,
        run_id: &str,
        workspace: &Path,
        record: &mut RepositoryBackupRecord,
        errors: &mut Vec<String>,
    ) -> Result<()> {
        fs::create_dir_all(workspace).map_err(|e| Error::OperationFailed {
            operation: "create_workspace".to_string(),
            cause: format!("{}: {e}", workspace.display()),
        })?;

        if !fetcher.fetch(record.name.as_str(), workspace, errors) {
            // Diagnostic already recorded; the record stays Failed.
            return Ok(());
        }

        let fingerprint = checksum::fingerprint(workspace)?;
        record.checksum = Some(fingerprint.digest);
        record.files_skipped = fingerprint.files_skipped;

        let archive_path = archiver.package(workspace, &record.name, run_id)?;

        // A checksum alone never implies success: the archive must exist
        // on disk with a non-zero size.
        if let Some(size) = archive::verified_size(&archive_path) {
            record.size_bytes = size;
            record.status = RecordStatus::Success;
        }
        record.archive_path = Some(archive_path);

        Ok(())
    }
}
