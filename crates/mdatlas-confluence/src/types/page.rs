//! Confluence page and space types.

use serde::Deserialize;

/// Confluence page.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Version information.
    pub version: Version,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

/// Page version.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
}

/// Hypermedia links.
#[derive(Debug, Clone, Deserialize)]
pub struct Links {
    /// Web UI link, relative to the base URL.
    #[serde(default)]
    pub webui: Option<String>,
}

/// Content search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub results: Vec<Page>,
}

/// Confluence space.
#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    pub key: String,
    pub name: String,
}
