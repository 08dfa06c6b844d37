//! Source-control provider backed by the `gh` CLI.
//!
//! Listing uses `gh repo list <org> --limit <n> --json name` and parses
//! the JSON payload; cloning uses `gh repo clone <org>/<name> <dest>`.
//! Credentials are whatever the ambient `gh auth` session provides.

use super::{RepoDescriptor, SourceControlProvider};
use crate::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// [`SourceControlProvider`] implementation shelling out to the GitHub CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhCliProvider;

impl GhCliProvider {
    /// Creates a new provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `gh` with the given arguments, mapping spawn failures and
    /// non-zero exits into [`Error::OperationFailed`] with stderr attached.
    fn run_gh(operation: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!(?args, "invoking gh");
        let output = Command::new("gh")
            .args(args)
            .output()
            .map_err(|e| Error::OperationFailed {
                operation: operation.to_string(),
                cause: format!("failed to run gh: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: format!("gh exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}

impl SourceControlProvider for GhCliProvider {
    fn list_repositories(&self, organization: &str, limit: usize) -> Result<Vec<RepoDescriptor>> {
        let limit = limit.to_string();
        let stdout = Self::run_gh(
            "list_repositories",
            &[
                "repo",
                "list",
                organization,
                "--limit",
                limit.as_str(),
                "--json",
                "name",
            ],
        )?;

        serde_json::from_slice(&stdout).map_err(|e| Error::OperationFailed {
            operation: "list_repositories".to_string(),
            cause: format!("unparseable gh output: {e}"),
        })
    }

    fn clone_repository(&self, organization: &str, name: &str, destination: &Path) -> Result<()> {
        let qualified = format!("{organization}/{name}");
        let dest = destination.to_string_lossy().into_owned();
        Self::run_gh(
            "clone_repository",
            &["repo", "clone", qualified.as_str(), dest.as_str()],
        )?;
        Ok(())
    }
}
