//! Error types for dirsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a directory client behind one of the port traits.
///
/// The reconciler passes these through unchanged; it never inspects them
/// beyond deciding whether a run continues.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Connection, TLS or timeout failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// The addressed resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials were rejected (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Credential material could not be parsed or used for signing.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// Client construction failed (bad endpoint, empty token, ...).
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure on the config file itself.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (`dirsync config` output).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// A required field was empty after all layers were merged.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// The source credentials file could not be read.
    #[error("failed to read credentials file {path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.dirsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
