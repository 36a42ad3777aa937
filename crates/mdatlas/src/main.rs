//! mdatlas CLI - Markdown to Confluence and Jira.
//!
//! Provides commands for:
//! - `convert`: Convert Markdown files to Confluence storage format or Jira wiki markup
//! - `confluence publish` / `confluence check`: Publish pages, test the connection
//! - `jira publish` / `jira check`: Create or update issues, test the connection
//! - `config show`: Print the effective configuration

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigCommand, ConfluenceCommand, ConvertArgs, JiraCommand};
use output::Output;

/// mdatlas - Markdown to Confluence and Jira.
#[derive(Parser)]
#[command(name = "mdatlas", version, about)]
struct Cli {
    /// Log progress at info level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Markdown files.
    Convert(ConvertArgs),
    /// Confluence publishing commands.
    #[command(subcommand)]
    Confluence(ConfluenceCommand),
    /// Jira publishing commands.
    #[command(subcommand)]
    Jira(JiraCommand),
    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::Confluence(cmd) => cmd.execute(),
        Commands::Jira(cmd) => cmd.execute(),
        Commands::Config(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
