//! Error types for dirsync-sync.

use thiserror::Error;

use dirsync_core::{ConfigError, DirectoryError, Email};

/// All errors that end a sync run.
///
/// Directory failures pass through unchanged; the run stops at the first one
/// and nothing already applied is rolled back.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A read, mutation or membership check against either directory failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A target lookup failed and the lookup policy is `abort`.
    #[error("lookup of {email} failed: {source}")]
    Lookup {
        email: Email,
        #[source]
        source: DirectoryError,
    },

    /// Configuration could not be loaded or was incomplete.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The run's cancel token was set; no further operations were issued.
    #[error("sync cancelled")]
    Cancelled,
}
