//! Jira integration for mdatlas.
//!
//! - [`JiraClient`]: REST API v2 client with basic authentication
//! - [`IssuePublisher`]: create, update or comment on issues from converted documents
//! - [`parse_time_estimate`]: `2h` / `1d` / `1w` style estimates in seconds
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use mdatlas_jira::{IssueOptions, IssuePublisher, IssueTarget, JiraClient};
//!
//! let client = JiraClient::new("https://jira.example.com", "bot", "token", "OPS");
//! let publisher = IssuePublisher::new(&client, IssueOptions::default());
//! let result = publisher.publish_file(Path::new("task.md"), &IssueTarget::Create)?;
//! println!("{} {}", result.action, result.url);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod estimate;
mod publisher;
mod types;

pub use client::{JiraClient, NewIssue};
pub use error::{JiraError, PublishError};
pub use estimate::parse_time_estimate;
pub use publisher::{
    IssueAction, IssueOptions, IssuePublisher, IssueResult, IssueTarget, convert_issue, plan,
    planned_estimate, prepare,
};
pub use types::{Comment, CreatedIssue, Project};
