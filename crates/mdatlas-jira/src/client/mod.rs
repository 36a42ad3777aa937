//! Jira REST API v2 client.

mod issues;

pub use issues::NewIssue;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mdatlas_config::JiraConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;
use ureq::Agent;
use ureq::http::Response;

use crate::error::JiraError;
use crate::types::Project;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Jira REST API client bound to one project.
pub struct JiraClient {
    agent: Agent,
    base_url: String,
    project_key: String,
    auth_header: String,
}

impl JiraClient {
    /// Create a client.
    #[must_use]
    pub fn new(base_url: &str, username: &str, api_token: &str, project_key: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        let credentials = STANDARD.encode(format!("{username}:{api_token}"));
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            project_key: project_key.to_owned(),
            auth_header: format!("Basic {credentials}"),
        }
    }

    /// Create a client from the `[jira]` section.
    #[must_use]
    pub fn from_config(config: &JiraConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.username,
            &config.api_token,
            &config.project_key,
        )
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Browser URL for an issue.
    pub fn issue_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    /// Fetch the configured project, proving URL and credentials work.
    pub fn check(&self) -> Result<Project, JiraError> {
        let url = format!("{}/project/{}", self.api_url(), self.project_key);
        info!("Checking access to project {}", self.project_key);

        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()?;
        read_json(response)?.ok_or(JiraError::EmptyResponse("project lookup"))
    }

    fn api_url(&self) -> String {
        format!("{}/rest/api/2", self.base_url)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &Value,
    ) -> Result<Option<T>, JiraError> {
        let payload_bytes = serde_json::to_vec(payload)?;
        let response = self
            .agent
            .post(url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;
        read_json(response)
    }

    fn put_json(&self, url: &str, payload: &Value) -> Result<(), JiraError> {
        let payload_bytes = serde_json::to_vec(payload)?;
        let response = self
            .agent
            .put(url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;
        read_json::<Value>(response)?;
        Ok(())
    }
}

/// Decode a JSON body; `None` for 204 and other empty bodies.
fn read_json<T: DeserializeOwned>(response: Response<ureq::Body>) -> Result<Option<T>, JiraError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(JiraError::HttpResponse {
            status,
            body: error_body,
        });
    }

    let body = body_reader.read_to_string()?;
    if status == 204 || body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&body)?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_urls() {
        let client = JiraClient::new("https://jira.example.com/", "bot", "token", "OPS");
        assert_eq!(client.api_url(), "https://jira.example.com/rest/api/2");
        assert_eq!(client.issue_url("OPS-7"), "https://jira.example.com/browse/OPS-7");
        assert_eq!(client.project_key(), "OPS");
    }

    #[test]
    fn test_auth_header() {
        let client = JiraClient::new("https://jira.example.com", "bot", "token", "OPS");
        assert_eq!(client.auth_header, "Basic Ym90OnRva2Vu");
    }
}
