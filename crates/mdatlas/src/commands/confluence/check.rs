//! `mdatlas confluence check` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdatlas_config::Config;
use mdatlas_confluence::ConfluenceClient;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the confluence check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover mdatlas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CheckArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let confluence = config.require_confluence()?;

        output.info(&format!("Connecting to {}...", confluence.base_url));
        let space = ConfluenceClient::from_config(confluence).check()?;
        output.success(&format!("Connected: space {} ({})", space.key, space.name));
        Ok(())
    }
}
