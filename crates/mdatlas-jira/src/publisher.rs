//! Publish converted documents as Jira issues or comments.

use std::fmt;
use std::path::Path;

use mdatlas_config::JiraConfig;
use mdatlas_renderer::{
    Conversion, ConvertError, Dialect, Document, RenderOptions, before_estimate, convert, extract,
};
use tracing::warn;

use crate::client::{JiraClient, NewIssue};
use crate::error::PublishError;
use crate::estimate::parse_time_estimate;

/// What to do with a converted document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueTarget {
    /// Create a new issue.
    Create,
    /// Replace summary and description of an existing issue.
    Update(String),
    /// Add the document as a comment on an existing issue.
    Comment(String),
}

/// What a publish did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueAction {
    Created,
    Updated,
    Commented,
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Commented => f.write_str("commented on"),
        }
    }
}

/// Issue fields that do not come from the document.
#[derive(Clone, Debug)]
pub struct IssueOptions {
    pub render: RenderOptions,
    pub issue_type: String,
    pub priority: String,
    pub assignee: Option<String>,
    /// Parent issue given on the command line; beats front matter.
    pub parent_key: Option<String>,
    /// Parent issue from configuration; used when nothing else names one.
    pub default_parent_key: Option<String>,
    /// Merged with front matter components.
    pub components: Vec<String>,
    /// Merged with front matter labels.
    pub labels: Vec<String>,
    /// Estimate given on the command line; beats the document estimate.
    pub time_estimate: Option<String>,
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            issue_type: "Task".to_owned(),
            priority: "Medium".to_owned(),
            assignee: None,
            parent_key: None,
            default_parent_key: None,
            components: Vec::new(),
            labels: Vec::new(),
            time_estimate: None,
        }
    }
}

impl IssueOptions {
    /// Defaults from the `[jira]` section.
    #[must_use]
    pub fn from_config(config: &JiraConfig, render: RenderOptions) -> Self {
        Self {
            render,
            issue_type: config.issue_type.clone(),
            priority: config.priority.clone(),
            assignee: config.assignee.clone(),
            parent_key: None,
            default_parent_key: config.parent_key.clone(),
            components: config.components.clone(),
            labels: config.labels.clone(),
            time_estimate: None,
        }
    }
}

/// Outcome of a publish.
#[derive(Clone, Debug)]
pub struct IssueResult {
    pub key: String,
    pub url: String,
    pub action: IssueAction,
    /// Estimate that was set, in seconds.
    pub estimate_seconds: Option<u64>,
    /// Recoverable problems, such as an unparseable estimate.
    pub warnings: Vec<String>,
}

/// Read and convert a Markdown file into Jira wiki markup.
///
/// # Errors
///
/// Returns [`PublishError::Io`] if the file cannot be read and
/// [`PublishError::Convert`] if conversion fails.
pub fn prepare(path: &Path, options: &RenderOptions) -> Result<Conversion, PublishError> {
    let source = std::fs::read_to_string(path)?;
    let document = Document::parse(&source).with_path(path);
    Ok(convert_issue(&document, options)?)
}

/// Convert a document into an issue description.
///
/// The description stops before the `Estimated Time Frame` line. Metadata,
/// including the estimate, still comes from the whole document.
///
/// # Errors
///
/// See [`convert`].
pub fn convert_issue(
    document: &Document,
    options: &RenderOptions,
) -> Result<Conversion, ConvertError> {
    let description = Document {
        body: before_estimate(&document.body).to_owned(),
        ..document.clone()
    };
    let mut conversion = convert(&description, Dialect::Jira, options)?;
    conversion.metadata = extract(document);
    Ok(conversion)
}

/// Build the issue fields for a conversion.
#[must_use]
pub fn plan(conversion: &Conversion, options: &IssueOptions) -> NewIssue {
    let metadata = &conversion.metadata;
    NewIssue {
        summary: metadata.title.clone(),
        description: conversion.markup.clone(),
        issue_type: options.issue_type.clone(),
        priority: options.priority.clone(),
        components: merge(&options.components, &metadata.components),
        labels: merge(&options.labels, &metadata.labels),
        assignee: options.assignee.clone(),
        parent_key: options
            .parent_key
            .clone()
            .or_else(|| metadata.parent.clone())
            .or_else(|| options.default_parent_key.clone()),
    }
}

/// Estimate to set for a conversion, if any.
#[must_use]
pub fn planned_estimate<'a>(
    conversion: &'a Conversion,
    options: &'a IssueOptions,
) -> Option<&'a str> {
    options
        .time_estimate
        .as_deref()
        .or(conversion.metadata.time_estimate.as_deref())
}

fn merge(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged = first.to_vec();
    for item in second {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Creates, updates or comments on issues in one project.
pub struct IssuePublisher<'a> {
    client: &'a JiraClient,
    options: IssueOptions,
}

impl<'a> IssuePublisher<'a> {
    /// Create a new issue publisher.
    #[must_use]
    pub fn new(client: &'a JiraClient, options: IssueOptions) -> Self {
        Self { client, options }
    }

    /// Convert and publish a Markdown file.
    ///
    /// # Errors
    ///
    /// See [`prepare`] and [`publish`](Self::publish).
    pub fn publish_file(
        &self,
        path: &Path,
        target: &IssueTarget,
    ) -> Result<IssueResult, PublishError> {
        let conversion = prepare(path, &self.options.render)?;
        self.publish(&conversion, target)
    }

    /// Publish a conversion to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Jira`] if the create, update or comment call
    /// fails. A failure to set the estimate afterwards is only a warning.
    pub fn publish(
        &self,
        conversion: &Conversion,
        target: &IssueTarget,
    ) -> Result<IssueResult, PublishError> {
        let mut warnings = Vec::new();

        if let Some(project) = &conversion.metadata.space_or_project
            && project != self.client.project_key()
        {
            let message = format!(
                "front matter project {project} ignored; publishing to {}",
                self.client.project_key()
            );
            warn!("{message}");
            warnings.push(message);
        }

        let (key, action) = match target {
            IssueTarget::Create => {
                let created = self.client.create_issue(&plan(conversion, &self.options))?;
                (created.key, IssueAction::Created)
            }
            IssueTarget::Update(key) => {
                self.client
                    .update_issue(key, &conversion.metadata.title, &conversion.markup)?;
                (key.clone(), IssueAction::Updated)
            }
            IssueTarget::Comment(key) => {
                self.client.add_comment(key, &conversion.markup)?;
                (key.clone(), IssueAction::Commented)
            }
        };

        let estimate_seconds = if action == IssueAction::Commented {
            None
        } else {
            self.apply_estimate(&key, conversion, &mut warnings)
        };

        Ok(IssueResult {
            url: self.client.issue_url(&key),
            key,
            action,
            estimate_seconds,
            warnings,
        })
    }

    fn apply_estimate(
        &self,
        key: &str,
        conversion: &Conversion,
        warnings: &mut Vec<String>,
    ) -> Option<u64> {
        let estimate = planned_estimate(conversion, &self.options)?;
        let Some(seconds) = parse_time_estimate(estimate) else {
            warnings.push(format!("could not parse time estimate '{estimate}'"));
            return None;
        };

        match self.client.set_time_estimate(key, seconds) {
            Ok(()) => Some(seconds),
            Err(e) => {
                let message = format!("failed to set time estimate on {key}: {e}");
                warn!("{message}");
                warnings.push(message);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn conversion(source: &str) -> Conversion {
        convert_issue(&Document::parse(source), &RenderOptions::default()).unwrap()
    }

    #[test]
    fn test_plan_from_document() {
        let doc = conversion(
            "---\ncomponents: [\"10011\"]\nlabels: docs, api\n---\n# Ship it\n\nDo **this**.\n",
        );
        let options = IssueOptions {
            components: vec!["10013".to_owned()],
            labels: vec!["docs".to_owned()],
            ..IssueOptions::default()
        };
        let issue = plan(&doc, &options);
        assert_eq!(issue.summary, "Ship it");
        assert_eq!(issue.description, "h1. Ship it\n\nDo *this*.");
        assert_eq!(issue.issue_type, "Task");
        assert_eq!(issue.priority, "Medium");
        assert_eq!(issue.components, vec!["10013", "10011"]);
        assert_eq!(issue.labels, vec!["docs", "api"]);
    }

    #[test]
    fn test_plan_parent_precedence() {
        let doc = conversion("---\nparent: OPS-2\n---\n# T\n");
        let options = IssueOptions {
            default_parent_key: Some("OPS-1".to_owned()),
            ..IssueOptions::default()
        };
        assert_eq!(plan(&doc, &options).parent_key.as_deref(), Some("OPS-2"));

        let options = IssueOptions {
            parent_key: Some("OPS-3".to_owned()),
            ..options
        };
        assert_eq!(plan(&doc, &options).parent_key.as_deref(), Some("OPS-3"));

        let options = IssueOptions {
            default_parent_key: Some("OPS-1".to_owned()),
            ..IssueOptions::default()
        };
        assert_eq!(
            plan(&conversion("# T\n"), &options).parent_key.as_deref(),
            Some("OPS-1")
        );
    }

    #[test]
    fn test_planned_estimate_precedence() {
        let doc = conversion("# T\n\nEstimated Time Frame: 3-5 days\n");
        let options = IssueOptions::default();
        assert_eq!(planned_estimate(&doc, &options), Some("5d"));

        let options = IssueOptions {
            time_estimate: Some("2h".to_owned()),
            ..IssueOptions::default()
        };
        assert_eq!(planned_estimate(&doc, &options), Some("2h"));
        assert_eq!(planned_estimate(&conversion("# T\n"), &IssueOptions::default()), None);
    }

    #[test]
    fn test_description_stops_before_estimate() {
        let doc = conversion("# T\n\nScope.\n\nEstimated Time Frame: 3-5 days\n\nTrailing.\n");
        assert_eq!(doc.markup, "h1. T\n\nScope.");
        assert_eq!(doc.metadata.title, "T");
        assert_eq!(planned_estimate(&doc, &IssueOptions::default()), Some("5d"));
        assert_eq!(plan(&doc, &IssueOptions::default()).description, "h1. T\n\nScope.");
    }

    #[test]
    fn test_options_from_config() {
        let config: JiraConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://jira.example.com",
            "username": "bot",
            "api_token": "t",
            "project_key": "OPS",
            "priority": "High",
            "parent_key": "OPS-1",
            "labels": ["x"]
        }))
        .unwrap();
        let options = IssueOptions::from_config(&config, RenderOptions::default());
        assert_eq!(options.issue_type, "Task");
        assert_eq!(options.priority, "High");
        assert_eq!(options.parent_key, None);
        assert_eq!(options.default_parent_key.as_deref(), Some("OPS-1"));
        assert_eq!(options.labels, vec!["x"]);
    }

    #[test]
    fn test_prepare_reads_and_converts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.md");
        std::fs::write(&path, "# Fix login\n\n- one\n- two\n").unwrap();

        let conversion = prepare(&path, &RenderOptions::default()).unwrap();
        assert_eq!(conversion.markup, "h1. Fix login\n\n* one\n* two");
        assert_eq!(conversion.metadata.title, "Fix login");
    }

    #[test]
    fn test_action_display() {
        assert_eq!(IssueAction::Commented.to_string(), "commented on");
    }
}
