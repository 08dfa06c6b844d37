//! Deterministic content fingerprints over directory trees.
//!
//! The fingerprint streams every regular file's bytes into a single
//! SHA-256 accumulator, visiting entries at each level in lexicographic
//! order (files first, then subdirectories). Sorting makes the digest
//! independent of the filesystem's native iteration order, so the same
//! tree contents always produce the same digest.
//!
//! The fingerprint is best-effort over *readable* files: unreadable
//! entries are skipped and counted rather than failing the traversal.
//! Symbolic links, permissions, and timestamps do not contribute.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Result of fingerprinting a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFingerprint {
    /// Lowercase hex SHA-256 digest of the tree's file contents.
    pub digest: String,
    /// Regular files whose bytes contributed to the digest.
    pub files_hashed: u64,
    /// Entries skipped as unreadable.
    pub files_skipped: u64,
}

/// Computes the deterministic fingerprint of a directory tree.
///
/// # Errors
///
/// Returns an error if `directory` itself cannot be read. Unreadable
/// entries *below* it are skipped and counted in
/// [`TreeFingerprint::files_skipped`] instead of failing the traversal.
pub fn fingerprint(directory: &Path) -> Result<TreeFingerprint> {
    let mut hasher = Sha256::new();
    let mut hashed = 0u64;
    let mut skipped = 0u64;

    hash_tree(directory, &mut hasher, &mut hashed, &mut skipped, true)?;

    Ok(TreeFingerprint {
        digest: hex::encode(hasher.finalize()),
        files_hashed: hashed,
        files_skipped: skipped,
    })
}

/// Hashes one directory level: files in sorted order, then subdirectories
/// in sorted order.
fn hash_tree(
    dir: &Path,
    hasher: &mut Sha256,
    hashed: &mut u64,
    skipped: &mut u64,
    is_root: bool,
) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if is_root => {
            return Err(Error::OperationFailed {
                operation: "fingerprint".to_string(),
                cause: format!("cannot read {}: {e}", dir.display()),
            });
        }
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            *skipped += 1;
            return Ok(());
        }
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            *skipped += 1;
            continue;
        };
        // file_type() does not follow symlinks, which keeps links out of
        // the digest entirely.
        if file_type.is_file() {
            files.push(entry.path());
        } else if file_type.is_dir() {
            subdirs.push(entry.path());
        }
    }
    files.sort();
    subdirs.sort();

    for path in files {
        match File::open(&path) {
            Ok(mut file) => match std::io::copy(&mut file, hasher) {
                Ok(_) => *hashed += 1,
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "skipping unreadable file");
                    *skipped += 1;
                }
            },
            Err(e) => {
                debug!(file = %path.display(), error = %e, "skipping unreadable file");
                *skipped += 1;
            }
        }
    }

    for path in subdirs {
        hash_tree(&path, hasher, hashed, skipped, false)?;
    }

    Ok(())
}
