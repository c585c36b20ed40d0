pub mod config;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dirsync_core::{config as core_config, ConfigError, SyncConfig};

use crate::{LogFormatArg, LookupPolicyArg};

/// Settings layered over the config file. Flags beat env vars beat the file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Config file to read instead of `~/.dirsync/config.yaml`.
    #[arg(long, env = "DIRSYNC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the Google service-account key (or the key JSON itself with
    /// `--inline-credentials`).
    #[arg(long, env = "DIRSYNC_GOOGLE_CREDENTIALS", hide_env_values = true)]
    pub google_credentials: Option<String>,

    /// Workspace admin the service account impersonates.
    #[arg(long, env = "DIRSYNC_GOOGLE_ADMIN")]
    pub google_admin: Option<String>,

    /// SCIM base URL of the target directory.
    #[arg(long, env = "DIRSYNC_SCIM_ENDPOINT")]
    pub scim_endpoint: Option<String>,

    /// SCIM bearer token.
    #[arg(long, env = "DIRSYNC_SCIM_ACCESS_TOKEN", hide_env_values = true)]
    pub scim_access_token: Option<String>,

    /// Treat `--google-credentials` as inline key JSON rather than a path.
    /// `--inline-credentials false` turns a file setting back off.
    #[arg(
        long,
        env = "DIRSYNC_INLINE_CREDENTIALS",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub inline_credentials: Option<bool>,

    /// What to do when a target lookup fails: treat_as_not_found or abort.
    #[arg(long, env = "DIRSYNC_LOOKUP_ERRORS", value_name = "POLICY")]
    pub lookup_errors: Option<LookupPolicyArg>,

    /// Log level filter used when `RUST_LOG` is unset.
    #[arg(long, env = "DIRSYNC_LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log output format: text or json.
    #[arg(long, env = "DIRSYNC_LOG_FORMAT", value_name = "FORMAT")]
    pub log_format: Option<LogFormatArg>,
}

impl ConfigOverrides {
    /// Load the config file (explicit path or the default location) and apply
    /// every override that was given.
    pub fn resolve(&self) -> Result<SyncConfig> {
        let mut cfg = match &self.config {
            Some(path) => core_config::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => defaults_without_home(core_config::load()).context("failed to load config")?,
        };
        self.apply(&mut cfg);
        Ok(cfg)
    }

    fn apply(&self, cfg: &mut SyncConfig) {
        if let Some(v) = &self.google_credentials {
            cfg.google_credentials = v.clone();
        }
        if let Some(v) = &self.google_admin {
            cfg.google_admin = v.clone();
        }
        if let Some(v) = &self.scim_endpoint {
            cfg.scim_endpoint = v.clone();
        }
        if let Some(v) = &self.scim_access_token {
            cfg.scim_access_token = v.clone();
        }
        if let Some(v) = self.inline_credentials {
            cfg.inline_credentials = v;
        }
        if let Some(v) = self.lookup_errors {
            cfg.lookup_errors = v.0;
        }
        if let Some(v) = &self.log_level {
            cfg.log_level = v.clone();
        }
        if let Some(v) = self.log_format {
            cfg.log_format = v.0;
        }
    }
}

/// With no home directory there is no default file: every setting then comes
/// from flags or `DIRSYNC_*` variables.
fn defaults_without_home(
    loaded: std::result::Result<SyncConfig, ConfigError>,
) -> std::result::Result<SyncConfig, ConfigError> {
    match loaded {
        Err(ConfigError::HomeNotFound) => {
            tracing::debug!("no home directory, skipping the default config file");
            Ok(SyncConfig::default())
        }
        other => other,
    }
}
