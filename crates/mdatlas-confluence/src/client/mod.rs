//! Confluence REST API client.
//!
//! Provides a sync HTTP client for the Confluence Server/Data Center and
//! Cloud REST API with basic authentication (username and API token).

mod pages;
mod space;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mdatlas_config::ConfluenceConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use ureq::Agent;
use ureq::http::Response;

use crate::error::ConfluenceError;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Confluence REST API client bound to one space.
pub struct ConfluenceClient {
    agent: Agent,
    base_url: String,
    space_key: String,
    auth_header: String,
}

impl ConfluenceClient {
    /// Create a client.
    #[must_use]
    pub fn new(base_url: &str, username: &str, api_token: &str, space_key: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            space_key: space_key.to_owned(),
            auth_header: basic_auth(username, api_token),
        }
    }

    /// Create a client from the `[confluence]` section.
    #[must_use]
    pub fn from_config(config: &ConfluenceConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.username,
            &config.api_token,
            &config.space_key,
        )
    }

    /// Space pages are published into.
    pub fn space_key(&self) -> &str {
        &self.space_key
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/rest/api", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ConfluenceError> {
        let response = self
            .agent
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()?;
        read_json(response)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &Value,
    ) -> Result<T, ConfluenceError> {
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

    fn put_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &Value,
    ) -> Result<T, ConfluenceError> {
        let payload_bytes = serde_json::to_vec(payload)?;
        let response = self
            .agent
            .put(url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;
        read_json(response)
    }
}

/// `Authorization` header value for basic auth.
fn basic_auth(username: &str, api_token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{api_token}")))
}

/// Decode a JSON body, turning error statuses into [`ConfluenceError::HttpResponse`].
fn read_json<T: DeserializeOwned>(response: Response<ureq::Body>) -> Result<T, ConfluenceError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(ConfluenceError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body_reader.read_json()?)
}
