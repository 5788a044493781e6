//! Source checkout synchronization.

pub mod archive;
pub mod sync;

pub use archive::{archive_url, parse_repo_url, Provider};
pub use sync::{verify_marker, RepoSynchronizer, SyncMethod, SyncOutcome};
