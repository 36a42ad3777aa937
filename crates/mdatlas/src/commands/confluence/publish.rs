//! `mdatlas confluence publish` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mdatlas_config::{CliSettings, Config};
use mdatlas_confluence::{
    ConfluenceClient, PagePublisher, PublishOptions, PublishResult, plan, prepare,
};

use crate::commands::{Batch, print_metadata, print_warnings, render_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the confluence publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Markdown files to publish, processed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Parent page title (overrides front matter and config).
    #[arg(long)]
    parent_page: Option<String>,

    /// Page title (overrides the document title; single file only).
    #[arg(long)]
    page_title: Option<String>,

    /// Target space key (overrides config).
    #[arg(long)]
    space_key: Option<String>,

    /// Convert and show what would be published without calling Confluence.
    #[arg(long)]
    dry_run: bool,

    /// Render math spans as math macros (overrides config).
    #[arg(long)]
    enable_math: bool,

    /// Path to configuration file (default: auto-discover mdatlas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl PublishArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if self.page_title.is_some() && self.files.len() > 1 {
            return Err(CliError::Validation(
                "--page-title can only be used with a single file".to_owned(),
            ));
        }

        let cli_settings = CliSettings {
            enable_math: self.enable_math.then_some(true),
            space_key: self.space_key.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let options = PublishOptions {
            render: render_options(&config.render),
            parent_page: self.parent_page.clone(),
            default_parent_page: config
                .confluence
                .as_ref()
                .and_then(|c| c.parent_page.clone()),
            page_title: self.page_title.clone(),
        };

        let mut batch = Batch::new(&output);
        if self.dry_run {
            for path in &self.files {
                batch.run(path, || dry_run(&output, path, &options));
            }
            output.highlight("\n[DRY RUN] No changes made.");
            return batch.finish();
        }

        let client = ConfluenceClient::from_config(config.require_confluence()?);
        let publisher = PagePublisher::new(&client, options);
        for path in &self.files {
            batch.run(path, || {
                output.info(&format!("Publishing {}...", path.display()));
                let result = publisher.publish_file(path)?;
                print_publish_result(&output, &result);
                Ok::<(), CliError>(())
            });
        }
        batch.finish()
    }
}

fn dry_run(output: &Output, path: &Path, options: &PublishOptions) -> Result<(), CliError> {
    let conversion = prepare(path, &options.render)?;
    let plan = plan(&conversion, options);

    output.highlight(&format!("{}", path.display()));
    print_metadata(output, &conversion.metadata);
    output.info(&format!("Would publish page \"{}\"", plan.title));
    match &plan.parent_title {
        Some(parent) => output.info(&format!("Under parent \"{parent}\"")),
        None => output.info("At space root"),
    }
    print_warnings(output, &conversion.warnings);
    output.emit(&conversion.markup);
    Ok(())
}

fn print_publish_result(output: &Output, result: &PublishResult) {
    if result.created {
        output.success("Page created successfully!");
    } else {
        output.success("Page updated successfully!");
    }
    output.info(&format!("ID: {}", result.page_id));
    output.info(&format!("Title: {}", result.title));
    output.info(&format!("Version: {}", result.version));
    output.info(&format!("URL: {}", result.url));
    for warning in &result.warnings {
        output.warning(&format!("Warning: {warning}"));
    }
}
