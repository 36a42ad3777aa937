//! Jira API types.

use serde::Deserialize;

/// Response to an issue creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    /// Issue key such as `OPS-42`.
    pub key: String,
}

/// A posted comment.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
}

/// Jira project.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub key: String,
    pub name: String,
}
