//! Capability interfaces for the external version-control surfaces.
//!
//! The pipeline touches exactly two external systems: the source-control
//! provider that lists and clones the fleet, and the version-controlled
//! durable sink that receives finished artifacts. Both are modeled as
//! narrow synchronous traits so the orchestration logic stays testable
//! with fake implementations.

mod github;
mod sink;

pub use github::GhCliProvider;
pub use sink::GitWorkingCopySink;

use crate::Result;
use serde::Deserialize;
use std::path::Path;

/// Minimal descriptor for one remote repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoDescriptor {
    /// Repository name within the organization.
    pub name: String,
}

/// Listing and cloning capability of the remote source-control host.
pub trait SourceControlProvider {
    /// Lists up to `limit` repositories owned by `organization`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing call fails. Callers treat this as
    /// non-fatal: the run proceeds with an empty fleet.
    fn list_repositories(&self, organization: &str, limit: usize) -> Result<Vec<RepoDescriptor>>;

    /// Materializes a working copy of `organization/name` at `destination`.
    ///
    /// The destination must be an empty (or absent) directory.
    ///
    /// # Errors
    ///
    /// Returns an error on any clone failure: network, authentication,
    /// or a nonexistent repository.
    fn clone_repository(&self, organization: &str, name: &str, destination: &Path) -> Result<()>;
}

/// Stage/commit/push capability of the durable sink working copy.
pub trait VersionControlSink {
    /// Stages every change in the working copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated.
    fn stage_all(&self, working_copy: &Path) -> Result<()>;

    /// Commits the staged changes with the given message.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be created.
    fn commit(&self, working_copy: &Path, message: &str) -> Result<()>;

    /// Pushes the current branch to its configured remote.
    ///
    /// # Errors
    ///
    /// Returns an error if no remote is configured or the push fails.
    fn push(&self, working_copy: &Path) -> Result<()>;
}
