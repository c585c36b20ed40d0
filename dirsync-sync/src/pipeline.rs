//! Shared sync pipeline entrypoint used by the CLI.

use std::time::Duration;

use dirsync_core::{SourceDirectory, SyncConfig, TargetDirectory};
use dirsync_google::GoogleDirectory;
use dirsync_scim::ScimClient;

use crate::{CancelToken, Reconciler, SyncError, SyncOptions, SyncReport};

/// Run both passes against the given directories.
///
/// Principals are reconciled first; a failure there returns before any group
/// is touched.
pub fn run<S, T>(
    source: &S,
    target: &T,
    options: SyncOptions,
    cancel: &CancelToken,
) -> Result<SyncReport, SyncError>
where
    S: SourceDirectory + ?Sized,
    T: TargetDirectory + ?Sized,
{
    let mut reconciler = Reconciler::new(source, target, options, cancel.clone());
    reconciler.sync_principals()?;
    reconciler.sync_groups()?;

    let report = reconciler.into_report();
    tracing::info!(
        "sync {} ({})",
        if report.dry_run { "planned" } else { "complete" },
        report.summary()
    );
    Ok(report)
}

/// Build the Google source and SCIM target from `config`, then [`run`].
///
/// This is the canonical sync entrypoint for `dirsync sync`.
pub fn run_with_config(
    config: &SyncConfig,
    dry_run: bool,
    cancel: &CancelToken,
) -> Result<SyncReport, SyncError> {
    config.validate()?;

    tracing::info!("creating the Google and SCIM clients");
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let credentials = config.load_credentials()?;
    let source = GoogleDirectory::new(&credentials, &config.google_admin, timeout)?;
    let target = ScimClient::new(&config.scim_endpoint, &config.scim_access_token, timeout)?;

    let options = SyncOptions {
        dry_run,
        lookup_errors: config.lookup_errors,
    };
    run(&source, &target, options, cancel)
}

#[cfg(test)]
mod tests {
    use dirsync_core::{ConfigError, DirectoryError};

    use super::*;

    fn config() -> SyncConfig {
        SyncConfig {
            google_credentials: "{}".into(),
            inline_credentials: true,
            google_admin: "admin@x.com".into(),
            scim_endpoint: "https://scim.example.com/scim/v2".into(),
            scim_access_token: "tok".into(),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn incomplete_config_fails_before_building_clients() {
        let cfg = SyncConfig {
            scim_endpoint: String::new(),
            ..config()
        };
        let err = run_with_config(&cfg, true, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SyncError::Config(ConfigError::Missing("scim_endpoint"))));
    }

    #[test]
    fn unusable_credentials_surface_as_directory_error() {
        let err = run_with_config(&config(), true, &CancelToken::new()).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Directory(DirectoryError::Credentials(_))
        ));
    }
}
