//! dirsync: one-way Google Workspace → SCIM directory sync.
//!
//! # Usage
//!
//! ```text
//! dirsync sync [--dry-run] [--json] [--config <path>] [overrides…]
//! dirsync config [--config <path>] [overrides…]
//! ```
//!
//! Every setting can also come from a `DIRSYNC_*` environment variable; see
//! `dirsync sync --help`.

mod commands;
mod logging;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigArgs, sync::SyncArgs};
use dirsync_core::{LogFormat, LookupErrorPolicy};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dirsync",
    version,
    about = "Sync users, groups and memberships from Google Workspace into a SCIM directory",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the target directory against the source directory.
    Sync(SyncArgs),

    /// Print the effective configuration with secrets redacted.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Shared enum arguments parsed from CLI strings
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `LookupErrorPolicy` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct LookupPolicyArg(pub LookupErrorPolicy);

impl FromStr for LookupPolicyArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "treat_as_not_found" => Ok(Self(LookupErrorPolicy::TreatAsNotFound)),
            "abort" => Ok(Self(LookupErrorPolicy::Abort)),
            other => Err(format!(
                "unknown lookup policy '{other}'; expected: treat_as_not_found, abort"
            )),
        }
    }
}

impl fmt::Display for LookupPolicyArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Thin wrapper so clap can parse `LogFormat` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct LogFormatArg(pub LogFormat);

impl FromStr for LogFormatArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self(LogFormat::Text)),
            "json" => Ok(Self(LogFormat::Json)),
            other => Err(format!("unknown log format '{other}'; expected: text, json")),
        }
    }
}

impl fmt::Display for LogFormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Config(args) => args.run(),
    }
}
