//! Space lookup, used as the connection check.

use tracing::info;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::Space;

impl ConfluenceClient {
    /// Fetch the configured space, proving URL and credentials work.
    pub fn check(&self) -> Result<Space, ConfluenceError> {
        let url = format!("{}/space/{}", self.api_url(), self.space_key);
        info!("Checking access to space {}", self.space_key);
        self.get_json(&url)
    }
}
