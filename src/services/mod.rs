//! Business logic services.
//!
//! Services sequence the providers, checksum engine, archiver, and store
//! into the backup pipeline and provide high-level operations.

mod backup;
mod enumerator;
mod fetcher;
mod publish;

pub use backup::{BackupProgress, BackupService};
pub use enumerator::RepositoryEnumerator;
pub use fetcher::SnapshotFetcher;
pub use publish::PublishService;
