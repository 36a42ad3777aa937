//! Confluence integration for mdatlas.
//!
//! - [`ConfluenceClient`]: REST API client with basic authentication
//! - [`PagePublisher`]: create-or-update workflow for converted documents
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use mdatlas_confluence::{ConfluenceClient, PagePublisher, PublishOptions};
//!
//! let client = ConfluenceClient::new("https://wiki.example.com", "bot", "token", "DOCS");
//! let publisher = PagePublisher::new(&client, PublishOptions::default());
//! let result = publisher.publish_file(Path::new("guide.md"))?;
//! println!("{} (version {})", result.url, result.version);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod publisher;
mod types;

pub use client::ConfluenceClient;
pub use error::{ConfluenceError, PublishError};
pub use publisher::{PagePlan, PagePublisher, PublishOptions, PublishResult, plan, prepare};
pub use types::{Page, SearchResults, Space};
