//! CLI command implementations.

pub(crate) mod config;
pub(crate) mod confluence;
pub(crate) mod convert;
pub(crate) mod jira;

pub(crate) use config::ConfigCommand;
pub(crate) use confluence::ConfluenceCommand;
pub(crate) use convert::ConvertArgs;
pub(crate) use jira::JiraCommand;

use std::path::Path;

use mdatlas_config::RenderConfig;
use mdatlas_renderer::{PublishMetadata, RenderOptions, Warning};

use crate::error::CliError;
use crate::output::Output;

/// Map the `[render]` section onto renderer options.
pub(crate) fn render_options(config: &RenderConfig) -> RenderOptions {
    RenderOptions {
        enable_math: config.enable_math,
        preserve_line_breaks: config.preserve_line_breaks,
        strip_title: config.strip_title,
    }
}

/// Counts per-file failures so one bad file never stops the rest.
pub(crate) struct Batch<'a> {
    output: &'a Output,
    total: usize,
    failed: usize,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(output: &'a Output) -> Self {
        Self {
            output,
            total: 0,
            failed: 0,
        }
    }

    /// Run `step` for one file, reporting its error instead of returning it.
    pub(crate) fn run<E: std::fmt::Display>(
        &mut self,
        path: &Path,
        step: impl FnOnce() -> Result<(), E>,
    ) {
        self.total += 1;
        if let Err(err) = step() {
            self.failed += 1;
            self.output
                .error(&format!("{}: {err}", path.display()));
        }
    }

    /// `Err` if any file failed.
    pub(crate) fn finish(self) -> Result<(), CliError> {
        if self.failed == 0 {
            return Ok(());
        }
        Err(CliError::Batch {
            failed: self.failed,
            total: self.total,
        })
    }
}

pub(crate) fn print_metadata(output: &Output, metadata: &PublishMetadata) {
    output.info(&format!("Title: {}", metadata.title));
    if let Some(key) = &metadata.space_or_project {
        output.info(&format!("Space/project: {key}"));
    }
    if let Some(parent) = &metadata.parent {
        output.info(&format!("Parent: {parent}"));
    }
    if !metadata.labels.is_empty() {
        output.info(&format!("Labels: {}", metadata.labels.join(", ")));
    }
    if !metadata.components.is_empty() {
        output.info(&format!("Components: {}", metadata.components.join(", ")));
    }
    if let Some(estimate) = &metadata.time_estimate {
        output.info(&format!("Estimate: {estimate}"));
    }
}

pub(crate) fn print_warnings(output: &Output, warnings: &[Warning]) {
    for warning in warnings {
        output.warning(&format!("Warning: {warning}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_from_config() {
        let options = render_options(&RenderConfig {
            enable_math: true,
            preserve_line_breaks: false,
            strip_title: true,
        });
        assert!(options.enable_math);
        assert!(!options.preserve_line_breaks);
        assert!(options.strip_title);
    }

    #[test]
    fn test_batch_counts_failures() {
        let output = Output::new();
        let mut batch = Batch::new(&output);
        batch.run(Path::new("a.md"), || Ok::<(), String>(()));
        batch.run(Path::new("b.md"), || Err("boom".to_owned()));
        batch.run(Path::new("c.md"), || Ok::<(), String>(()));
        let err = batch.finish().unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 file(s) failed");
    }

    #[test]
    fn test_batch_all_ok() {
        let output = Output::new();
        let mut batch = Batch::new(&output);
        batch.run(Path::new("a.md"), || Ok::<(), String>(()));
        assert!(batch.finish().is_ok());
    }
}
