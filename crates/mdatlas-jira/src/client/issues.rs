//! Issue operations for Jira API.

use serde_json::{Value, json};
use tracing::{debug, info};

use super::JiraClient;
use crate::error::JiraError;
use crate::types::{Comment, CreatedIssue};

/// Fields of an issue to create.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub summary: String,
    /// Description in Jira wiki markup.
    pub description: String,
    pub issue_type: String,
    pub priority: String,
    /// Component ids.
    pub components: Vec<String>,
    pub labels: Vec<String>,
    pub assignee: Option<String>,
    pub parent_key: Option<String>,
}

impl JiraClient {
    /// Create an issue in the client's project.
    pub fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, JiraError> {
        let url = format!("{}/issue", self.api_url());
        let payload = create_payload(&self.project_key, issue);
        debug!(%url, "Creating issue");
        info!("Creating issue '{}' in project {}", issue.summary, self.project_key);

        let created: CreatedIssue = self
            .post_json(&url, &payload)?
            .ok_or(JiraError::EmptyResponse("issue creation"))?;
        info!("Created issue {}", created.key);
        Ok(created)
    }

    /// Replace summary and description of an issue.
    pub fn update_issue(
        &self,
        key: &str,
        summary: &str,
        description: &str,
    ) -> Result<(), JiraError> {
        let url = format!("{}/issue/{}", self.api_url(), key);
        info!("Updating issue {}", key);
        self.put_json(&url, &update_payload(summary, description))
    }

    /// Add a comment to an issue.
    pub fn add_comment(&self, key: &str, body: &str) -> Result<Option<Comment>, JiraError> {
        let url = format!("{}/issue/{}/comment", self.api_url(), key);
        info!("Adding comment to issue {}", key);
        self.post_json(&url, &json!({ "body": body }))
    }

    /// Set the original estimate of an issue.
    pub fn set_time_estimate(&self, key: &str, seconds: u64) -> Result<(), JiraError> {
        let url = format!("{}/issue/{}", self.api_url(), key);
        info!("Setting time estimate of {} to {}s", key, seconds);
        self.put_json(&url, &estimate_payload(seconds))
    }
}

fn create_payload(project_key: &str, issue: &NewIssue) -> Value {
    let components: Vec<Value> = issue
        .components
        .iter()
        .map(|id| json!({ "id": id }))
        .collect();

    let mut payload = json!({
        "fields": {
            "project": {"key": project_key},
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": {"name": issue.issue_type},
            "priority": {"name": issue.priority},
            "components": components,
            "labels": issue.labels,
        }
    });

    if let Some(assignee) = &issue.assignee {
        payload["fields"]["assignee"] = json!({ "name": assignee });
    }
    if let Some(parent) = &issue.parent_key {
        payload["fields"]["parent"] = json!({ "key": parent });
    }
    payload
}

fn update_payload(summary: &str, description: &str) -> Value {
    json!({
        "fields": {
            "summary": summary,
            "description": description,
        }
    })
}

fn estimate_payload(seconds: u64) -> Value {
    json!({
        "fields": {
            "timetracking": {"originalEstimate": format!("{seconds}s")}
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn issue() -> NewIssue {
        NewIssue {
            summary: "Ship it".to_owned(),
            description: "h1. Ship it".to_owned(),
            issue_type: "Task".to_owned(),
            priority: "Medium".to_owned(),
            components: vec!["10013".to_owned()],
            labels: vec!["docs".to_owned()],
            assignee: None,
            parent_key: None,
        }
    }

    #[test]
    fn test_create_payload_fields() {
        let payload = create_payload("OPS", &issue());
        let fields = &payload["fields"];
        assert_eq!(fields["project"]["key"], "OPS");
        assert_eq!(fields["summary"], "Ship it");
        assert_eq!(fields["description"], "h1. Ship it");
        assert_eq!(fields["issuetype"]["name"], "Task");
        assert_eq!(fields["priority"]["name"], "Medium");
        assert_eq!(fields["components"], json!([{"id": "10013"}]));
        assert_eq!(fields["labels"], json!(["docs"]));
        assert!(fields.get("assignee").is_none());
        assert!(fields.get("parent").is_none());
    }

    #[test]
    fn test_create_payload_optional_fields() {
        let payload = create_payload(
            "OPS",
            &NewIssue {
                assignee: Some("sam".to_owned()),
                parent_key: Some("OPS-1".to_owned()),
                ..issue()
            },
        );
        assert_eq!(payload["fields"]["assignee"]["name"], "sam");
        assert_eq!(payload["fields"]["parent"]["key"], "OPS-1");
    }

    #[test]
    fn test_update_payload() {
        assert_eq!(
            update_payload("S", "D"),
            json!({"fields": {"summary": "S", "description": "D"}})
        );
    }

    #[test]
    fn test_estimate_payload() {
        assert_eq!(
            estimate_payload(7200),
            json!({"fields": {"timetracking": {"originalEstimate": "7200s"}}})
        );
    }
}
