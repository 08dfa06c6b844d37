//! Local backup store.
//!
//! A filesystem directory holding this host's archive artifacts
//! (`{repo}_{run_id}.tar.gz`), one JSON run log per run
//! (`backup_log_{run_id}.json`), and a `temp/` area for per-repository
//! workspaces during a run.
//!
//! # Security
//!
//! Repository names are validated before being used in store paths to
//! prevent directory escape via crafted names.

use crate::models::BackupRun;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension carried by archive artifacts.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Handle to the local backup store directory.
pub struct BackupStore {
    /// Store root.
    root: PathBuf,
}

impl BackupStore {
    /// Opens the store, creating the root directory if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| Error::OperationFailed {
            operation: "create_backup_store".to_string(),
            cause: format!("{}: {e}", root.display()),
        })?;
        Ok(Self { root })
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the run-log path for a run.
    #[must_use]
    pub fn log_path(&self, run_id: &str) -> PathBuf {
        self.root.join(format!("backup_log_{run_id}.json"))
    }

    /// Returns the workspace directory for one repository.
    ///
    /// Workspaces live under `{root}/temp/{name}` and are owned by the
    /// orchestrator for the duration of one repository's processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository name would escape the store.
    pub fn workspace_for(&self, name: &str) -> Result<PathBuf> {
        validate_repo_name(name)?;
        Ok(self.root.join("temp").join(name))
    }

    /// Serializes a run to its JSON log artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_run_log(&self, run: &BackupRun) -> Result<PathBuf> {
        let path = self.log_path(&run.run_id);
        let json = serde_json::to_string_pretty(run).map_err(|e| Error::OperationFailed {
            operation: "serialize_run_log".to_string(),
            cause: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| Error::OperationFailed {
            operation: "write_run_log".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        debug!(log = %path.display(), "run log written");
        Ok(path)
    }

    /// Lists every regular file at the store root.
    ///
    /// This is the set the publisher copies into the durable sink:
    /// archives plus run logs, but not the `temp/` workspace area.
    ///
    /// # Errors
    ///
    /// Returns an error if the store root cannot be read.
    pub fn artifacts(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| Error::OperationFailed {
            operation: "list_artifacts".to_string(),
            cause: format!("{}: {e}", self.root.display()),
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Lists the archive artifacts (`*.tar.gz`) at the store root.
    ///
    /// # Errors
    ///
    /// Returns an error if the store root cannot be read.
    pub fn archives(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .artifacts()?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(ARCHIVE_EXTENSION))
            })
            .collect())
    }
}

/// Validates that a repository name is safe to use in store paths.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for empty names, path separators, or
/// parent-directory references.
pub fn validate_repo_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("empty repository name".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(Error::InvalidInput(format!(
            "repository name '{name}' contains path components"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BackupRun;

    #[test]
    fn test_open_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let store = BackupStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn test_log_and_workspace_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        assert_eq!(
            store.log_path("20250101_000000"),
            dir.path().join("backup_log_20250101_000000.json")
        );
        assert_eq!(
            store.workspace_for("alpha").unwrap(),
            dir.path().join("temp").join("alpha")
        );
    }

    #[test]
    fn test_workspace_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        assert!(store.workspace_for("..").is_err());
        assert!(store.workspace_for("a/b").is_err());
        assert!(store.workspace_for("").is_err());
    }

    #[test]
    fn test_write_run_log_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        let mut run = BackupRun::start();
        run.record_error("listing failed");
        run.finalize();

        let path = store.write_run_log(&run).unwrap();
        let json = std::fs::read_to_string(path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["status"], "completed");
        assert_eq!(parsed["errors"][0], "listing failed");
        assert_eq!(parsed["summary"]["total"], 0);
    }

    #[test]
    fn test_archives_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("a_run.tar.gz"), b"x").unwrap();
        std::fs::write(dir.path().join("backup_log_run.json"), b"{}").unwrap();
        std::fs::create_dir(dir.path().join("temp")).unwrap();

        let artifacts = store.artifacts().unwrap();
        assert_eq!(artifacts.len(), 2);
        let archives = store.archives().unwrap();
        assert_eq!(archives.len(), 1);
        assert!(archives[0].ends_with("a_run.tar.gz"));
    }
}
