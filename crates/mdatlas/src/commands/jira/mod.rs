//! `mdatlas jira` subcommand group.

mod check;
mod publish;

use clap::Subcommand;

use check::CheckArgs;
use publish::PublishArgs;

use crate::error::CliError;

/// Jira commands.
#[derive(Subcommand)]
pub(crate) enum JiraCommand {
    /// Create issues, update them or comment on them from Markdown files.
    Publish(PublishArgs),
    /// Verify URL, credentials and project access.
    Check(CheckArgs),
}

impl JiraCommand {
    /// Execute the jira subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Publish(args) => args.execute(),
            Self::Check(args) => args.execute(),
        }
    }
}
