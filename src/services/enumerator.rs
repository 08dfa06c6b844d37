//! Repository enumeration service.

use crate::config::VaultConfig;
use crate::provider::SourceControlProvider;
use tracing::{info, warn};

/// Lists the fleet of repositories to back up.
///
/// The repository reserved for the durable sink is filtered out so the
/// backup store is never backed up into itself. A listing failure is
/// non-fatal: it yields an empty fleet plus one diagnostic, and the run
/// proceeds.
pub struct RepositoryEnumerator<'a, P: SourceControlProvider> {
    provider: &'a P,
    organization: String,
    sink_repo: String,
    limit: usize,
}

impl<'a, P: SourceControlProvider> RepositoryEnumerator<'a, P> {
    /// Creates a new enumerator from configuration.
    pub fn new(provider: &'a P, config: &VaultConfig) -> Self {
        Self {
            provider,
            organization: config.organization.clone(),
            sink_repo: config.sink_repo.clone(),
            limit: config.repo_limit,
        }
    }

    /// Lists repository names in discovery order.
    ///
    /// On provider failure, appends one diagnostic to `errors` and
    /// returns an empty list.
    pub fn list(&self, errors: &mut Vec<String>) -> Vec<String> {
        match self
            .provider
            .list_repositories(&self.organization, self.limit)
        {
            Ok(repos) => {
                let names: Vec<String> = repos
                    .into_iter()
                    .map(|r| r.name)
                    .filter(|name| *name != self.sink_repo)
                    .collect();
                info!(count = names.len(), organization = %self.organization, "fleet enumerated");
                names
            }
            Err(e) => {
                warn!(error = %e, "repository listing failed; proceeding with empty fleet");
                errors.push(format!("Failed to list repositories: {e}"));
                Vec::new()
            }
        }
    }
}
