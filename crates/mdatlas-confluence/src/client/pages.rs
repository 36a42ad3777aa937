//! Page operations for Confluence API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Value, json};
use tracing::info;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::{Page, SearchResults};

impl ConfluenceClient {
    /// Find a page in the client's space by exact title.
    pub fn find_page(&self, title: &str) -> Result<Option<Page>, ConfluenceError> {
        let url = find_page_url(&self.api_url(), &self.space_key, title);
        info!("Looking up page '{}' in space {}", title, self.space_key);

        let results: SearchResults = self.get_json(&url)?;
        Ok(results.results.into_iter().next())
    }

    /// Create a page, optionally under `parent_id`.
    pub fn create_page(
        &self,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content", self.api_url());
        let payload = create_payload(&self.space_key, title, body, parent_id);

        info!("Creating page '{}' in space {}", title, self.space_key);
        let page: Page = self.post_json(&url, &payload)?;
        info!("Created page {}", page.id);
        Ok(page)
    }

    /// Update existing page (auto-increments version).
    pub fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        version: u32,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);
        let payload = update_payload(title, body, version);

        info!(
            "Updating page {} from version {} to {}",
            page_id,
            version,
            version + 1
        );
        let page: Page = self.put_json(&url, &payload)?;
        info!("Updated page {} to version {}", page_id, page.version.number);
        Ok(page)
    }

    /// Web URL for a page.
    pub fn page_url(&self, page: &Page) -> String {
        match page.links.as_ref().and_then(|links| links.webui.as_deref()) {
            Some(webui) => format!("{}{}", self.base_url, webui),
            None => format!(
                "{}/pages/viewpage.action?pageId={}",
                self.base_url, page.id
            ),
        }
    }
}

fn find_page_url(api_url: &str, space_key: &str, title: &str) -> String {
    format!(
        "{}/content?title={}&spaceKey={}&expand=version",
        api_url,
        utf8_percent_encode(title, NON_ALPHANUMERIC),
        utf8_percent_encode(space_key, NON_ALPHANUMERIC)
    )
}

fn storage_body(body: &str) -> Value {
    json!({
        "storage": {
            "value": body,
            "representation": "storage"
        }
    })
}

fn create_payload(space_key: &str, title: &str, body: &str, parent_id: Option<&str>) -> Value {
    let mut payload = json!({
        "type": "page",
        "title": title,
        "space": {"key": space_key},
        "body": storage_body(body),
    });
    if let Some(id) = parent_id {
        payload["ancestors"] = json!([{"id": id}]);
    }
    payload
}

fn update_payload(title: &str, body: &str, version: u32) -> Value {
    json!({
        "type": "page",
        "title": title,
        "body": storage_body(body),
        "version": {"number": version + 1}
    })
}
