//! `dirsync config`: show the effective configuration.

use anyhow::{Context, Result};
use clap::Args;
use dirsync_core::config;

use super::ConfigOverrides;

/// Arguments for `dirsync config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the default config file location and exit.
    #[arg(long)]
    pub path: bool,

    /// Also report the first missing required setting, if any.
    #[arg(long)]
    pub check: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        if self.path {
            let home = config::home_dir().context("could not determine home directory")?;
            println!("{}", config::config_path_at(&home).display());
            return Ok(());
        }

        let cfg = self.overrides.resolve()?;
        print!("{}", cfg.to_redacted_yaml()?);

        if self.check {
            cfg.validate().context("configuration is incomplete")?;
            println!("# configuration is complete");
        }
        Ok(())
    }
}
