//! Publish converted documents as Confluence pages.
//!
//! A page is matched by title within the client's space: an existing page is
//! updated in place, otherwise a new one is created under the resolved parent.

use std::path::Path;

use mdatlas_renderer::{Conversion, Dialect, Document, RenderOptions, convert};
use tracing::{debug, warn};

use crate::client::ConfluenceClient;
use crate::error::PublishError;

/// Publishing switches that do not come from the document.
#[derive(Clone, Debug, Default)]
pub struct PublishOptions {
    pub render: RenderOptions,
    /// Parent page title given on the command line; beats front matter.
    pub parent_page: Option<String>,
    /// Parent page title from configuration; used when nothing else names one.
    pub default_parent_page: Option<String>,
    /// Page title given on the command line; beats the document title.
    pub page_title: Option<String>,
}

/// Where a conversion would land.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagePlan {
    pub title: String,
    pub parent_title: Option<String>,
}

/// Outcome of a publish.
#[derive(Clone, Debug)]
pub struct PublishResult {
    pub page_id: String,
    pub title: String,
    pub version: u32,
    pub url: String,
    /// True if the page did not exist before.
    pub created: bool,
    /// Recoverable problems, such as a missing parent page.
    pub warnings: Vec<String>,
}

/// Read and convert a Markdown file into storage format.
///
/// # Errors
///
/// Returns [`PublishError::Io`] if the file cannot be read and
/// [`PublishError::Convert`] if conversion fails.
pub fn prepare(path: &Path, options: &RenderOptions) -> Result<Conversion, PublishError> {
    let source = std::fs::read_to_string(path)?;
    let document = Document::parse(&source).with_path(path);
    Ok(convert(&document, Dialect::Confluence, options)?)
}

/// Resolve the page title and parent for a conversion.
#[must_use]
pub fn plan(conversion: &Conversion, options: &PublishOptions) -> PagePlan {
    let metadata = &conversion.metadata;
    PagePlan {
        title: options
            .page_title
            .clone()
            .unwrap_or_else(|| metadata.title.clone()),
        parent_title: options
            .parent_page
            .clone()
            .or_else(|| metadata.parent.clone())
            .or_else(|| options.default_parent_page.clone()),
    }
}

/// Creates or updates pages in one space.
pub struct PagePublisher<'a> {
    client: &'a ConfluenceClient,
    options: PublishOptions,
}

impl<'a> PagePublisher<'a> {
    /// Create a new page publisher.
    #[must_use]
    pub fn new(client: &'a ConfluenceClient, options: PublishOptions) -> Self {
        Self { client, options }
    }

    /// Convert and publish a Markdown file.
    ///
    /// # Errors
    ///
    /// See [`prepare`] and [`publish`](Self::publish).
    pub fn publish_file(&self, path: &Path) -> Result<PublishResult, PublishError> {
        let conversion = prepare(path, &self.options.render)?;
        self.publish(&conversion)
    }

    /// Publish a conversion, updating the page with the same title if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Confluence`] if any API call fails. A parent
    /// page that cannot be found is a warning, and the page goes to the space
    /// root.
    pub fn publish(&self, conversion: &Conversion) -> Result<PublishResult, PublishError> {
        let plan = plan(conversion, &self.options);
        let mut warnings = Vec::new();

        if let Some(space) = &conversion.metadata.space_or_project
            && space != self.client.space_key()
        {
            let message = format!(
                "front matter space {space} ignored; publishing to {}",
                self.client.space_key()
            );
            warn!("{message}");
            warnings.push(message);
        }

        let parent_id = match &plan.parent_title {
            Some(parent) => match self.client.find_page(parent)? {
                Some(page) => Some(page.id),
                None => {
                    let message =
                        format!("parent page '{parent}' not found; publishing at space root");
                    warn!("{message}");
                    warnings.push(message);
                    None
                }
            },
            None => None,
        };

        let existing = self.client.find_page(&plan.title)?;
        let created = existing.is_none();
        let page = match existing {
            Some(page) => {
                debug!(page_id = %page.id, "Page exists, updating");
                self.client.update_page(
                    &page.id,
                    &plan.title,
                    &conversion.markup,
                    page.version.number,
                )?
            }
            None => {
                self.client
                    .create_page(&plan.title, &conversion.markup, parent_id.as_deref())?
            }
        };

        Ok(PublishResult {
            url: self.client.page_url(&page),
            page_id: page.id,
            title: page.title,
            version: page.version.number,
            created,
            warnings,
        })
    }
}
