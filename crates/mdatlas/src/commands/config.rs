//! `mdatlas config` subcommand group.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use mdatlas_config::Config;

use crate::error::CliError;
use crate::output::Output;

/// Configuration commands.
#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Print the effective configuration with API tokens redacted.
    Show(ShowArgs),
}

impl ConfigCommand {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Show(args) => args.execute(),
        }
    }
}

/// Arguments for the config show command.
#[derive(Args)]
pub(crate) struct ShowArgs {
    /// Path to configuration file (default: auto-discover mdatlas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ShowArgs {
    fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        Output::new().emit(config.to_string().trim_end());
        Ok(())
    }
}
