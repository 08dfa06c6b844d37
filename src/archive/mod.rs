//! Archive packaging for repository snapshots.
//!
//! Packages a workspace directory into a single gzip-compressed tar
//! archive in the local backup store. The archiver does not verify its
//! own output and does not retry; the orchestrator checks that the
//! archive exists with a non-zero size before counting the backup as a
//! success.

use crate::{Error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Returns the archive's size in bytes when it exists on disk as a
/// regular file with a non-zero size, `None` otherwise.
///
/// A checksum alone never implies a successful backup; the orchestrator
/// counts a repository as backed up only after this check passes.
#[must_use]
pub fn verified_size(path: &Path) -> Option<u64> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Some(meta.len()),
        _ => None,
    }
}

/// Packages directories into `.tar.gz` archives in the backup store.
pub struct Archiver {
    /// Root of the local backup store.
    store_root: PathBuf,
}

impl Archiver {
    /// Creates a new archiver writing into the given store root.
    #[must_use]
    pub fn new(store_root: impl AsRef<Path>) -> Self {
        Self {
            store_root: store_root.as_ref().to_path_buf(),
        }
    }

    /// Returns the deterministic archive path for a repository and run.
    #[must_use]
    pub fn archive_path(&self, name: &str, run_id: &str) -> PathBuf {
        self.store_root.join(format!("{name}_{run_id}.tar.gz"))
    }

    /// Packages `source_dir` into `{store}/{name}_{run_id}.tar.gz`.
    ///
    /// The archive holds the directory's *contents* at the archive root,
    /// so extracting it reproduces the snapshot without an extra wrapping
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive file cannot be created or any
    /// entry cannot be appended.
    pub fn package(&self, source_dir: &Path, name: &str, run_id: &str) -> Result<PathBuf> {
        let archive_path = self.archive_path(name, run_id);
        debug!(archive = %archive_path.display(), source = %source_dir.display(), "packaging snapshot");

        let file = File::create(&archive_path).map_err(|e| Error::OperationFailed {
            operation: "create_archive".to_string(),
            cause: format!("{}: {e}", archive_path.display()),
        })?;

        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder
            .append_dir_all("", source_dir)
            .map_err(|e| Error::OperationFailed {
                operation: "append_archive_entries".to_string(),
                cause: e.to_string(),
            })?;

        // Finish the tar stream, then flush the gzip trailer.
        let encoder = builder.into_inner().map_err(|e| Error::OperationFailed {
            operation: "finish_archive".to_string(),
            cause: e.to_string(),
        })?;
        encoder.finish().map_err(|e| Error::OperationFailed {
            operation: "finish_archive".to_string(),
            cause: e.to_string(),
        })?;

        Ok(archive_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;

    #[test]
    fn test_package_produces_nonempty_archive() {
        let store = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("file.txt"), "contents").unwrap();
        fs::create_dir(source.path().join("nested")).unwrap();
        fs::write(source.path().join("nested").join("inner.txt"), "more").unwrap();

        let archiver = Archiver::new(store.path());
        let path = archiver
            .package(source.path(), "alpha", "20250101_000000")
            .unwrap();

        assert_eq!(path, store.path().join("alpha_20250101_000000.tar.gz"));
        let size = fs::metadata(&path).unwrap().len();
        assert!(size > 0);
    }

    #[test]
    fn test_archive_round_trips_snapshot_contents() {
        let store = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("readme.md"), "hello").unwrap();

        let archiver = Archiver::new(store.path());
        let path = archiver.package(source.path(), "alpha", "run").unwrap();

        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let out = tempfile::tempdir().unwrap();
        archive.unpack(out.path()).unwrap();
        assert_eq!(
            fs::read_to_string(out.path().join("readme.md")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_verified_size_accepts_packaged_archive() {
        let store = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("file.txt"), "contents").unwrap();

        let archiver = Archiver::new(store.path());
        let path = archiver.package(source.path(), "alpha", "run").unwrap();

        let size = verified_size(&path).unwrap();
        assert_eq!(size, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_verified_size_rejects_zero_byte_archive() {
        let store = tempfile::tempdir().unwrap();
        let path = store.path().join("alpha_run.tar.gz");
        fs::write(&path, b"").unwrap();

        assert!(path.exists());
        assert_eq!(verified_size(&path), None);
    }

    #[test]
    fn test_verified_size_rejects_missing_archive() {
        let store = tempfile::tempdir().unwrap();
        assert_eq!(verified_size(&store.path().join("gone.tar.gz")), None);
    }

    #[test]
    fn test_package_into_missing_store_fails() {
        let store = tempfile::tempdir().unwrap();
        let missing = store.path().join("nope");
        let source = tempfile::tempdir().unwrap();

        let archiver = Archiver::new(&missing);
        assert!(archiver.package(source.path(), "alpha", "run").is_err());
    }
}
