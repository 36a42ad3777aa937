//! `mdatlas convert` command implementation.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use mdatlas_config::{CliSettings, Config};
use mdatlas_renderer::{Dialect, Document, RenderOptions, convert};
use tracing::debug;

use super::{Batch, print_metadata, print_warnings, render_options};
use crate::error::CliError;
use crate::output::Output;

/// Output dialect.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum DialectArg {
    Confluence,
    Jira,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Confluence => Self::Confluence,
            DialectArg::Jira => Self::Jira,
        }
    }
}

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown files to convert, processed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Target markup.
    #[arg(short, long, value_enum)]
    dialect: DialectArg,

    /// Render math spans as math markup (overrides config).
    #[arg(long)]
    enable_math: bool,

    /// Directory for converted files (default: print to stdout).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdatlas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ConvertArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            enable_math: self.enable_math.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let options = render_options(&config.render);
        let dialect = Dialect::from(self.dialect);

        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut batch = Batch::new(&output);
        for path in &self.files {
            batch.run(path, || {
                self.convert_file(&output, path, dialect, &options)
            });
        }
        batch.finish()
    }

    fn convert_file(
        &self,
        output: &Output,
        path: &Path,
        dialect: Dialect,
        options: &RenderOptions,
    ) -> Result<(), CliError> {
        let source = std::fs::read_to_string(path)?;
        let document = Document::parse(&source).with_path(path);
        let conversion = convert(&document, dialect, options)?;
        debug!(file = %path.display(), %dialect, "Converted");

        output.highlight(&format!("{}", path.display()));
        print_metadata(output, &conversion.metadata);
        print_warnings(output, &conversion.warnings);

        match &self.output_dir {
            Some(dir) => {
                let target = output_path(dir, path, dialect);
                std::fs::write(&target, &conversion.markup)?;
                output.success(&format!("Wrote {}", target.display()));
            }
            None => output.emit(&conversion.markup),
        }
        Ok(())
    }
}

/// `<dir>/<stem>.<dialect extension>`.
fn output_path(dir: &Path, source: &Path, dialect: Dialect) -> PathBuf {
    let stem = source
        .file_stem()
        .map_or_else(|| "document".into(), |s| s.to_string_lossy());
    dir.join(format!("{stem}.{}", dialect.extension()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out"), Path::new("docs/guide.md"), Dialect::Jira),
            PathBuf::from("out/guide.jira.txt")
        );
        assert_eq!(
            output_path(Path::new("out"), Path::new("guide.md"), Dialect::Confluence),
            PathBuf::from("out/guide.confluence.xml")
        );
    }

    #[test]
    fn test_convert_writes_files_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        std::fs::write(&good, "# Good\n\n**bold**\n").unwrap();
        let missing = dir.path().join("missing.md");
        let config = dir.path().join("mdatlas.toml");
        std::fs::write(&config, "").unwrap();
        let out = dir.path().join("out");

        let args = ConvertArgs {
            files: vec![missing, good],
            dialect: DialectArg::Jira,
            enable_math: false,
            output_dir: Some(out.clone()),
            config: Some(config),
        };
        let err = args.execute().unwrap_err();
        assert!(matches!(err, CliError::Batch { failed: 1, total: 2 }));

        let written = std::fs::read_to_string(out.join("good.jira.txt")).unwrap();
        assert_eq!(written, "h1. Good\n\n*bold*");
    }
}
