//! `mdatlas confluence` subcommand group.

mod check;
mod publish;

use clap::Subcommand;

use check::CheckArgs;
use publish::PublishArgs;

use crate::error::CliError;

/// Confluence commands.
#[derive(Subcommand)]
pub(crate) enum ConfluenceCommand {
    /// Create or update pages from Markdown files.
    Publish(PublishArgs),
    /// Verify URL, credentials and space access.
    Check(CheckArgs),
}

impl ConfluenceCommand {
    /// Execute the confluence subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Publish(args) => args.execute(),
            Self::Check(args) => args.execute(),
        }
    }
}
