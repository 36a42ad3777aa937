//! Error types for Jira integration.

use mdatlas_renderer::ConvertError;

/// Error from Jira API operations.
#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body, usually Jira's `errorMessages` JSON.
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// A call that must return a body returned none.
    #[error("empty response from {0}")]
    EmptyResponse(&'static str),
}

/// Error while publishing a document to an issue.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The Markdown could not be converted.
    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),

    /// Jira API error.
    #[error("Jira API error: {0}")]
    Jira(#[from] JiraError),

    /// Reading the source document failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
