//! Error types for Confluence integration.

use mdatlas_renderer::ConvertError;

/// Error from Confluence API operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

/// Error while publishing a document as a page.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The Markdown could not be converted.
    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),

    /// Confluence API error.
    #[error("Confluence API error: {0}")]
    Confluence(#[from] ConfluenceError),

    /// Reading the source document failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
