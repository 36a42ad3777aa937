//! `mdatlas jira publish` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mdatlas_config::{CliSettings, Config};
use mdatlas_jira::{
    IssueOptions, IssuePublisher, IssueResult, IssueTarget, JiraClient, parse_time_estimate,
    plan, planned_estimate, prepare,
};

use crate::commands::{Batch, print_metadata, print_warnings, render_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Markdown files to publish, processed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Existing issue to update instead of creating a new one.
    #[arg(long)]
    issue_key: Option<String>,

    /// Add the document as a comment on --issue-key.
    #[arg(long, requires = "issue_key")]
    as_comment: bool,

    /// Parent issue for created issues (overrides front matter and config).
    #[arg(long)]
    parent_key: Option<String>,

    /// Project key (overrides config).
    #[arg(long)]
    project_key: Option<String>,

    /// Issue type name (overrides config).
    #[arg(long)]
    issue_type: Option<String>,

    /// Priority name (overrides config).
    #[arg(long)]
    priority: Option<String>,

    /// Assignee user name (overrides config).
    #[arg(long)]
    assignee: Option<String>,

    /// Original estimate such as 2h, 1d or 1w (overrides the document).
    #[arg(long)]
    time_estimate: Option<String>,

    /// Convert and show what would be published without calling Jira.
    #[arg(long)]
    dry_run: bool,

    /// Render math spans as {latex} (overrides config).
    #[arg(long)]
    enable_math: bool,

    /// Path to configuration file (default: auto-discover mdatlas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl PublishArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            enable_math: self.enable_math.then_some(true),
            project_key: self.project_key.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let render = render_options(&config.render);

        let mut options = match &config.jira {
            Some(jira) => IssueOptions::from_config(jira, render),
            None => IssueOptions {
                render,
                ..IssueOptions::default()
            },
        };
        self.apply_overrides(&mut options);
        let target = self.target();

        let mut batch = Batch::new(&output);
        if self.dry_run {
            for path in &self.files {
                batch.run(path, || dry_run(&output, path, &options, &target));
            }
            output.highlight("\n[DRY RUN] No changes made.");
            return batch.finish();
        }

        let client = JiraClient::from_config(config.require_jira()?);
        let publisher = IssuePublisher::new(&client, options);
        for path in &self.files {
            batch.run(path, || {
                output.info(&format!("Publishing {}...", path.display()));
                let result = publisher.publish_file(path, &target)?;
                print_issue_result(&output, &result);
                Ok::<(), CliError>(())
            });
        }
        batch.finish()
    }

    fn apply_overrides(&self, options: &mut IssueOptions) {
        if let Some(issue_type) = &self.issue_type {
            options.issue_type.clone_from(issue_type);
        }
        if let Some(priority) = &self.priority {
            options.priority.clone_from(priority);
        }
        if self.assignee.is_some() {
            options.assignee.clone_from(&self.assignee);
        }
        if self.parent_key.is_some() {
            options.parent_key.clone_from(&self.parent_key);
        }
        if self.time_estimate.is_some() {
            options.time_estimate.clone_from(&self.time_estimate);
        }
    }

    fn target(&self) -> IssueTarget {
        match &self.issue_key {
            Some(key) if self.as_comment => IssueTarget::Comment(key.clone()),
            Some(key) => IssueTarget::Update(key.clone()),
            None => IssueTarget::Create,
        }
    }
}

fn dry_run(
    output: &Output,
    path: &Path,
    options: &IssueOptions,
    target: &IssueTarget,
) -> Result<(), CliError> {
    let conversion = prepare(path, &options.render)?;

    output.highlight(&format!("{}", path.display()));
    print_metadata(output, &conversion.metadata);
    match target {
        IssueTarget::Create => {
            let issue = plan(&conversion, options);
            output.info(&format!(
                "Would create {} \"{}\" (priority {})",
                issue.issue_type, issue.summary, issue.priority
            ));
            if let Some(parent) = &issue.parent_key {
                output.info(&format!("Parent: {parent}"));
            }
        }
        IssueTarget::Update(key) => output.info(&format!("Would update {key}")),
        IssueTarget::Comment(key) => output.info(&format!("Would comment on {key}")),
    }
    if !matches!(target, IssueTarget::Comment(_))
        && let Some(estimate) = planned_estimate(&conversion, options)
    {
        match parse_time_estimate(estimate) {
            Some(seconds) => output.info(&format!("Estimate: {estimate} ({seconds}s)")),
            None => output.warning(&format!("Warning: could not parse time estimate '{estimate}'")),
        }
    }
    print_warnings(output, &conversion.warnings);
    output.emit(&conversion.markup);
    Ok(())
}

fn print_issue_result(output: &Output, result: &IssueResult) {
    output.success(&format!("Issue {} {}", result.key, result.action));
    output.info(&format!("URL: {}", result.url));
    if let Some(seconds) = result.estimate_seconds {
        output.info(&format!("Estimate: {seconds}s"));
    }
    for warning in &result.warnings {
        output.warning(&format!("Warning: {warning}"));
    }
}
