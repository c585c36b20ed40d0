//! `dirsync sync`: reconcile the SCIM target against Google Workspace.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use dirsync_sync::{pipeline, CancelToken, Change, SyncReport};

use super::ConfigOverrides;
use crate::logging;

/// Arguments for `dirsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Read both directories and report the changes a run would make,
    /// without applying any of them.
    #[arg(long, env = "DIRSYNC_DRY_RUN")]
    pub dry_run: bool,

    /// Emit the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.overrides.resolve()?;
        logging::init_tracing(&config.log_level, config.log_format);

        let cancel = CancelToken::new();
        let on_interrupt = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, stopping before the next directory call");
            on_interrupt.cancel();
        }) {
            tracing::warn!("could not install Ctrl-C handler: {e}");
        }

        let report = pipeline::run_with_config(&config, self.dry_run, &cancel)
            .context(if self.dry_run { "dry-run failed" } else { "sync failed" })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        print_report(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "Change")]
    change: String,
}

fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let summary = report.summary();

    if report.is_noop() {
        println!("{prefix}{} target already in sync", "✓".green().bold());
    } else {
        let verb = if report.dry_run { "planned" } else { "applied" };
        println!("{prefix}{} {verb}: {summary}", "✓".green().bold());
        let rows: Vec<ChangeRow> = report
            .changes
            .iter()
            .map(|change| ChangeRow {
                marker: marker(change),
                change: change.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    println!(
        "  {} users, {} groups correlated",
        report.correlated_users, report.correlated_groups
    );

    for failure in &report.lookup_failures {
        println!(
            "  {} lookup of {} failed, treated as not found: {}",
            "!".yellow().bold(),
            failure.email,
            failure.error
        );
    }
}

fn marker(change: &Change) -> String {
    match change {
        Change::UserCreated { .. } | Change::GroupCreated { .. } | Change::MemberAdded { .. } => {
            "+".green().bold().to_string()
        }
        Change::UserDeleted { .. } | Change::GroupDeleted { .. } | Change::MemberRemoved { .. } => {
            "-".red().bold().to_string()
        }
    }
}
