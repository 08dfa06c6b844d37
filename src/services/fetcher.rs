//! Repository snapshot fetching service.

use crate::provider::SourceControlProvider;
use std::path::Path;
use tracing::{debug, warn};

/// Obtains a point-in-time working copy of one repository into an
/// isolated, disposable workspace.
///
/// Returns a boolean rather than an error: any clone failure is recorded
/// as a diagnostic naming the repository and reported as `false`, so a
/// fault with one repository never escapes to the caller.
pub struct SnapshotFetcher<'a, P: SourceControlProvider> {
    provider: &'a P,
    organization: String,
}

impl<'a, P: SourceControlProvider> SnapshotFetcher<'a, P> {
    /// Creates a new fetcher for the given organization.
    pub fn new(provider: &'a P, organization: impl Into<String>) -> Self {
        Self {
            provider,
            organization: organization.into(),
        }
    }

    /// Clones `name` into `destination`, reporting success.
    pub fn fetch(&self, name: &str, destination: &Path, errors: &mut Vec<String>) -> bool {
        debug!(repository = %name, destination = %destination.display(), "fetching snapshot");
        match self
            .provider
            .clone_repository(&self.organization, name, destination)
        {
            Ok(()) => true,
            Err(e) => {
                warn!(repository = %name, error = %e, "clone failed");
                errors.push(format!("Failed to clone {name}: {e}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RepoDescriptor;
    use crate::{Error, Result};

    struct FailingProvider;

    impl SourceControlProvider for FailingProvider {
        fn list_repositories(&self, _org: &str, _limit: usize) -> Result<Vec<RepoDescriptor>> {
            Ok(Vec::new())
        }

        fn clone_repository(&self, _org: &str, name: &str, _dest: &Path) -> Result<()> {
            Err(Error::OperationFailed {
                operation: "clone_repository".to_string(),
                cause: format!("no such repository: {name}"),
            })
        }
    }

    #[test]
    fn test_fetch_failure_is_reported_not_propagated() {
        let provider = FailingProvider;
        let fetcher = SnapshotFetcher::new(&provider, "acme");
        let mut errors = Vec::new();
        let dest = tempfile::tempdir().unwrap();

        assert!(!fetcher.fetch("ghost", dest.path(), &mut errors));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("ghost"));
    }
}
