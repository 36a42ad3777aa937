//! CLI error types.

use mdatlas_config::ConfigError;
use mdatlas_confluence::ConfluenceError;
use mdatlas_jira::JiraError;
use mdatlas_renderer::ConvertError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Confluence(#[from] ConfluenceError),

    #[error("{0}")]
    ConfluencePublish(#[from] mdatlas_confluence::PublishError),

    #[error("{0}")]
    Jira(#[from] JiraError),

    #[error("{0}")]
    JiraPublish(#[from] mdatlas_jira::PublishError),

    #[error("{failed} of {total} file(s) failed")]
    Batch { failed: usize, total: usize },

    #[error("{0}")]
    Validation(String),
}
