//! Durable sink backed by a local git working copy.
//!
//! The sink is a separate clone of a persistent repository. Publishing
//! copies artifacts into it, then this implementation stages everything,
//! commits, and pushes the current branch to its remote using whatever
//! credentials the ambient git configuration provides (credential helper
//! or ssh-agent).

use super::VersionControlSink;
use crate::{Error, Result};
use git2::{IndexAddOption, Repository, Signature};
use std::path::Path;
use tracing::debug;

/// [`VersionControlSink`] implementation over a local git working copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitWorkingCopySink;

impl GitWorkingCopySink {
    /// Creates a new sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Opens the sink working copy.
    fn open_repo(working_copy: &Path) -> Result<Repository> {
        Repository::open(working_copy).map_err(|e| Error::OperationFailed {
            operation: "open_sink_repository".to_string(),
            cause: e.to_string(),
        })
    }

    /// Gets the default signature for commits.
    fn get_signature(repo: &Repository) -> Result<Signature<'_>> {
        repo.signature().or_else(|_| {
            Signature::now("repovault", "repovault@local").map_err(|e| Error::OperationFailed {
                operation: "create_signature".to_string(),
                cause: e.to_string(),
            })
        })
    }
}

impl VersionControlSink for GitWorkingCopySink {
    fn stage_all(&self, working_copy: &Path) -> Result<()> {
        let repo = Self::open_repo(working_copy)?;
        let mut index = repo.index().map_err(|e| Error::OperationFailed {
            operation: "open_index".to_string(),
            cause: e.to_string(),
        })?;

        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(|e| Error::OperationFailed {
                operation: "stage_all".to_string(),
                cause: e.to_string(),
            })?;
        index.write().map_err(|e| Error::OperationFailed {
            operation: "write_index".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn commit(&self, working_copy: &Path, message: &str) -> Result<()> {
        let repo = Self::open_repo(working_copy)?;
        let sig = Self::get_signature(&repo)?;

        let mut index = repo.index().map_err(|e| Error::OperationFailed {
            operation: "open_index".to_string(),
            cause: e.to_string(),
        })?;
        let tree_id = index.write_tree().map_err(|e| Error::OperationFailed {
            operation: "write_tree".to_string(),
            cause: e.to_string(),
        })?;
        let tree = repo.find_tree(tree_id).map_err(|e| Error::OperationFailed {
            operation: "find_tree".to_string(),
            cause: e.to_string(),
        })?;

        // First commit in a fresh sink has no parent.
        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(|e| Error::OperationFailed {
                operation: "resolve_head".to_string(),
                cause: e.to_string(),
            })?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) if e.code() == git2::ErrorCode::NotFound => None,
            Err(e) => {
                return Err(Error::OperationFailed {
                    operation: "resolve_head".to_string(),
                    cause: e.to_string(),
                });
            }
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(|e| Error::OperationFailed {
                operation: "commit".to_string(),
                cause: e.to_string(),
            })?;

        Ok(())
    }

    fn push(&self, working_copy: &Path) -> Result<()> {
        let repo = Self::open_repo(working_copy)?;

        let head = repo.head().map_err(|e| Error::OperationFailed {
            operation: "resolve_head".to_string(),
            cause: e.to_string(),
        })?;
        let branch_ref = head
            .name()
            .ok_or_else(|| Error::OperationFailed {
                operation: "push".to_string(),
                cause: "HEAD is not a named branch".to_string(),
            })?
            .to_string();

        let mut remote = repo.find_remote("origin").map_err(|e| Error::OperationFailed {
            operation: "find_remote".to_string(),
            cause: e.to_string(),
        })?;

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|url, username_from_url, allowed| {
            if allowed.contains(git2::CredentialType::SSH_KEY) {
                if let Some(user) = username_from_url {
                    return git2::Cred::ssh_key_from_agent(user);
                }
            }
            let config = git2::Config::open_default()?;
            git2::Cred::credential_helper(&config, url, username_from_url)
                .or_else(|_| git2::Cred::default())
        });
        let mut options = git2::PushOptions::new();
        options.remote_callbacks(callbacks);

        debug!(branch = %branch_ref, "pushing sink to origin");
        remote
            .push(&[branch_ref.as_str()], Some(&mut options))
            .map_err(|e| Error::OperationFailed {
                operation: "push".to_string(),
                cause: e.to_string(),
            })?;

        Ok(())
    }
}
