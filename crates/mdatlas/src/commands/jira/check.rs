//! `mdatlas jira check` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdatlas_config::Config;
use mdatlas_jira::JiraClient;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira check command.
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
        let jira = config.require_jira()?;

        output.info(&format!("Connecting to {}...", jira.base_url));
        let project = JiraClient::from_config(jira).check()?;
        output.success(&format!(
            "Connected: project {} ({})",
            project.key, project.name
        ));
        Ok(())
    }
}
