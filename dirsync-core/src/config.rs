//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.dirsync/
//!   config.yaml
//! ```
//!
//! # API pattern
//!
//! Loaders come in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! The file is one layer; the CLI overlays flags and `DIRSYNC_*` variables
//! on top and calls [`SyncConfig::validate`] on the merged result.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const REDACTED: &str = "[REDACTED]";

/// How a failed target lookup (as opposed to a clean "not found") is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorPolicy {
    /// Log, record in the run report, and continue as if the user were absent.
    /// A transient failure can therefore trigger a duplicate create attempt.
    #[default]
    TreatAsNotFound,
    /// Abort the run with the lookup error.
    Abort,
}

impl fmt::Display for LookupErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupErrorPolicy::TreatAsNotFound => write!(f, "treat_as_not_found"),
            LookupErrorPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Log output format for the CLI subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Settings for one sync run.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Path to the Google service-account key file, or the key JSON itself
    /// when `inline_credentials` is set.
    pub google_credentials: String,
    /// Workspace admin the service account impersonates.
    pub google_admin: String,
    /// SCIM base URL of the target directory.
    pub scim_endpoint: String,
    /// SCIM bearer token.
    pub scim_access_token: String,
    /// Treat `google_credentials` as inline key material rather than a path.
    #[serde(alias = "is_lambda")]
    pub inline_credentials: bool,
    pub lookup_errors: LookupErrorPolicy,
    pub log_level: String,
    pub log_format: LogFormat,
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            google_credentials: String::new(),
            google_admin: String::new(),
            scim_endpoint: String::new(),
            scim_access_token: String::new(),
            inline_credentials: false,
            lookup_errors: LookupErrorPolicy::default(),
            log_level: "info".to_owned(),
            log_format: LogFormat::default(),
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("google_credentials", &self.credentials_for_display())
            .field("google_admin", &self.google_admin)
            .field("scim_endpoint", &self.scim_endpoint)
            .field("scim_access_token", &REDACTED)
            .field("inline_credentials", &self.inline_credentials)
            .field("lookup_errors", &self.lookup_errors)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl SyncConfig {
    /// Check that every field needed to build both directory clients is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("google_credentials", &self.google_credentials),
            ("google_admin", &self.google_admin),
            ("scim_endpoint", &self.scim_endpoint),
            ("scim_access_token", &self.scim_access_token),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }
        Ok(())
    }

    /// Source credential bytes: the inline value, or the contents of the file
    /// `google_credentials` points at.
    pub fn load_credentials(&self) -> Result<Vec<u8>, ConfigError> {
        if self.inline_credentials {
            return Ok(self.google_credentials.clone().into_bytes());
        }
        let path = PathBuf::from(&self.google_credentials);
        std::fs::read(&path).map_err(|source| ConfigError::Credentials { path, source })
    }

    /// YAML rendering with secrets replaced, for `dirsync config`.
    pub fn to_redacted_yaml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        shown.google_credentials = self.credentials_for_display();
        if !shown.scim_access_token.is_empty() {
            shown.scim_access_token = REDACTED.to_owned();
        }
        Ok(serde_yaml::to_string(&shown)?)
    }

    fn credentials_for_display(&self) -> String {
        if self.inline_credentials && !self.google_credentials.is_empty() {
            REDACTED.to_owned()
        } else {
            self.google_credentials.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<home>/.dirsync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".dirsync").join("config.yaml")
}

/// Load a config file from an explicit path.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `<home>/.dirsync/config.yaml`, or defaults when the file does not exist.
pub fn load_at(home: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, ConfigError> {
    load_at(&home_dir()?)
}

/// The user's home directory, or `ConfigError::HomeNotFound`.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
