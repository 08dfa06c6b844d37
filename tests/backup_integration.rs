//! Integration tests for the backup pipeline.
//!
//! Drives the orchestrator and publisher end to end through fake
//! provider and sink implementations, covering the partial-failure
//! isolation, verification, and cleanup properties.
#![allow(clippy::panic, clippy::unwrap_used)]

use repovault::models::{RecordStatus, RunStatus};
use repovault::provider::{RepoDescriptor, SourceControlProvider, VersionControlSink};
use repovault::services::{BackupService, PublishService};
use repovault::store::BackupStore;
use repovault::{Error, Result, VaultConfig};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Fake provider: clones succeed for every repository except those in
/// `failing`, materializing a small tree per clone.
struct FakeProvider {
    names: Vec<&'static str>,
    failing: HashSet<&'static str>,
    /// When set, cloned trees are left empty so archives gzip to a
    /// non-zero size but the content digest stays the empty-tree digest.
    empty_clones: bool,
}

impl FakeProvider {
    fn new(names: Vec<&'static str>) -> Self {
        Self {
            names,
            failing: HashSet::new(),
            empty_clones: false,
        }
    }

    fn with_failing(mut self, name: &'static str) -> Self {
        self.failing.insert(name);
        self
    }
}

impl SourceControlProvider for FakeProvider {
    fn list_repositories(&self, _org: &str, _limit: usize) -> Result<Vec<RepoDescriptor>> {
        Ok(self
            .names
            .iter()
            .map(|n| RepoDescriptor {
                name: (*n).to_string(),
            })
            .collect())
    }

    fn clone_repository(&self, _org: &str, name: &str, dest: &Path) -> Result<()> {
        if self.failing.contains(name) {
            return Err(Error::OperationFailed {
                operation: "clone_repository".to_string(),
                cause: format!("repository {name} is unreachable"),
            });
        }
        fs::create_dir_all(dest).unwrap();
        if !self.empty_clones {
            fs::write(dest.join("README.md"), format!("# {name}\n")).unwrap();
            fs::create_dir(dest.join("src")).unwrap();
            fs::write(dest.join("src").join("lib.rs"), "pub fn f() {}\n").unwrap();
        }
        Ok(())
    }
}

/// Provider whose listing call always fails.
struct BrokenListing;

impl SourceControlProvider for BrokenListing {
    fn list_repositories(&self, _org: &str, _limit: usize) -> Result<Vec<RepoDescriptor>> {
        Err(Error::OperationFailed {
            operation: "list_repositories".to_string(),
            cause: "api returned 500".to_string(),
        })
    }

    fn clone_repository(&self, _org: &str, _name: &str, _dest: &Path) -> Result<()> {
        panic!("clone must not be attempted when listing fails");
    }
}

fn config(backup_dir: PathBuf) -> VaultConfig {
    VaultConfig::new()
        .with_organization("acme")
        .with_backup_dir(backup_dir)
}

#[test]
fn partial_failure_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec!["alpha", "beta"]).with_failing("beta");
    let run = BackupService::new(config(dir.path().to_path_buf()), provider)
        .run()
        .unwrap();

    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(run.summary.total, 2);
    assert_eq!(run.summary.success, 1);
    assert_eq!(run.summary.failed, 1);

    // beta's failure never affects alpha's record
    let alpha = &run.records[0];
    assert_eq!(alpha.name, "alpha");
    assert_eq!(alpha.status, RecordStatus::Success);
    assert!(alpha.checksum.is_some());
    assert!(alpha.size_bytes > 0);

    let beta = &run.records[1];
    assert_eq!(beta.status, RecordStatus::Failed);
    assert!(beta.checksum.is_none());
    assert!(beta.archive_path.is_none());

    assert_eq!(run.errors.len(), 1);
    assert!(run.errors[0].contains("beta"));
}

#[test]
fn empty_fleet_completes_trivially() {
    let dir = tempfile::tempdir().unwrap();
    let run = BackupService::new(config(dir.path().to_path_buf()), FakeProvider::new(vec![]))
        .run()
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.summary.total, 0);
    assert_eq!(run.summary.success, 0);
    assert_eq!(run.summary.failed, 0);
    assert!(run.errors.is_empty());
}

#[test]
fn listing_failure_completes_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let run = BackupService::new(config(dir.path().to_path_buf()), BrokenListing)
        .run()
        .unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.summary.total, 0);
    assert_eq!(run.errors.len(), 1);
    assert!(run.errors[0].contains("Failed to list repositories"));
}

#[test]
fn success_implies_verified_archive_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let run = BackupService::new(
        config(dir.path().to_path_buf()),
        FakeProvider::new(vec!["alpha"]),
    )
    .run()
    .unwrap();

    let record = &run.records[0];
    assert_eq!(record.status, RecordStatus::Success);
    let archive = record.archive_path.as_ref().unwrap();
    assert!(archive.exists());
    assert_eq!(fs::metadata(archive).unwrap().len(), record.size_bytes);
    assert!(record.size_bytes > 0);
    // Archive lands at the deterministic store path
    assert_eq!(
        archive,
        &dir.path().join(format!("alpha_{}.tar.gz", run.run_id))
    );
}

#[test]
fn workspaces_are_gone_after_run_even_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec!["alpha", "beta"]).with_failing("alpha");
    BackupService::new(config(dir.path().to_path_buf()), provider)
        .run()
        .unwrap();

    let temp = dir.path().join("temp");
    if temp.exists() {
        assert_eq!(
            fs::read_dir(&temp).unwrap().count(),
            0,
            "no per-repository workspace may remain"
        );
    }
}

#[test]
fn empty_clone_still_verifies_as_success() {
    // Even an empty tree gzips into a non-empty archive; verification
    // checks the archive, not the tree.
    let dir = tempfile::tempdir().unwrap();
    let mut provider = FakeProvider::new(vec!["alpha"]);
    provider.empty_clones = true;
    let run = BackupService::new(config(dir.path().to_path_buf()), provider)
        .run()
        .unwrap();

    let record = &run.records[0];
    assert_eq!(record.status, RecordStatus::Success);
    // Empty-tree digest is still recorded
    assert_eq!(
        record.checksum.as_deref().unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn run_log_serializes_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec!["alpha", "beta"]).with_failing("beta");
    let run = BackupService::new(config(dir.path().to_path_buf()), provider)
        .run()
        .unwrap();

    let store = BackupStore::open(dir.path()).unwrap();
    let log_path = store.write_run_log(&run).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(log_path).unwrap()).unwrap();

    assert_eq!(json["status"], "partial");
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["success"], 1);
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["repositories"][0]["name"], "alpha");
    assert_eq!(json["repositories"][0]["status"], "success");
    assert_eq!(json["repositories"][1]["status"], "failed");
}

/// Sink that optionally fails at a given step.
#[derive(Default)]
struct ScriptedSink {
    fail_at: Option<&'static str>,
}

impl VersionControlSink for ScriptedSink {
    fn stage_all(&self, _working_copy: &Path) -> Result<()> {
        if self.fail_at == Some("stage") {
            return Err(Error::OperationFailed {
                operation: "stage_all".to_string(),
                cause: "index locked".to_string(),
            });
        }
        Ok(())
    }

    fn commit(&self, _working_copy: &Path, _message: &str) -> Result<()> {
        if self.fail_at == Some("commit") {
            return Err(Error::OperationFailed {
                operation: "commit".to_string(),
                cause: "nothing to commit".to_string(),
            });
        }
        Ok(())
    }

    fn push(&self, _working_copy: &Path) -> Result<()> {
        if self.fail_at == Some("push") {
            return Err(Error::OperationFailed {
                operation: "push".to_string(),
                cause: "remote rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[test]
fn publish_after_run_copies_archives_and_log() {
    let store_dir = tempfile::tempdir().unwrap();
    let sink_dir = tempfile::tempdir().unwrap();

    let run = BackupService::new(
        config(store_dir.path().to_path_buf()),
        FakeProvider::new(vec!["alpha"]),
    )
    .run()
    .unwrap();
    let store = BackupStore::open(store_dir.path()).unwrap();
    store.write_run_log(&run).unwrap();

    let publish_config =
        config(store_dir.path().to_path_buf()).with_sink_path(sink_dir.path().to_path_buf());
    PublishService::new(publish_config, ScriptedSink::default())
        .publish(&run.run_id)
        .unwrap();

    let dest = sink_dir.path().join("backups").join(&run.run_id);
    assert!(dest.join(format!("alpha_{}.tar.gz", run.run_id)).exists());
    assert!(dest
        .join(format!("backup_log_{}.json", run.run_id))
        .exists());
}

#[test]
fn publish_failure_leaves_local_artifacts_intact() {
    let store_dir = tempfile::tempdir().unwrap();
    let sink_dir = tempfile::tempdir().unwrap();

    let run = BackupService::new(
        config(store_dir.path().to_path_buf()),
        FakeProvider::new(vec!["alpha"]),
    )
    .run()
    .unwrap();

    let publish_config =
        config(store_dir.path().to_path_buf()).with_sink_path(sink_dir.path().to_path_buf());
    let result = PublishService::new(
        publish_config,
        ScriptedSink {
            fail_at: Some("push"),
        },
    )
    .publish(&run.run_id);
    assert!(result.is_err());

    // The local archive survives the publish failure
    assert!(store_dir
        .path()
        .join(format!("alpha_{}.tar.gz", run.run_id))
        .exists());
}
