//! Markdown to Confluence storage format and Jira wiki markup transpiler.
//!
//! Conversion runs in four stages:
//! - [`preprocess`] rewrites strikethrough and definition lists, and swaps
//!   escaped characters and verbatim spans for placeholder tokens
//! - [`build`] folds the pulldown-cmark event stream into a [`NodeTree`]
//! - [`MarkupRenderer`] walks the tree and asks a [`RenderBackend`] for markup
//! - [`restore`] puts every protected literal back in place
//!
//! Two backends ship with the crate:
//! - [`ConfluenceBackend`]: XHTML storage format with `ac:` macros
//! - [`JiraBackend`]: Jira wiki markup
//!
//! Most callers only need [`convert`]:
//!
//! ```
//! use mdatlas_renderer::{Dialect, Document, RenderOptions, convert};
//!
//! let document = Document::parse("# Hello\n\n**Bold** text");
//! let conversion = convert(&document, Dialect::Jira, &RenderOptions::default()).unwrap();
//! assert_eq!(conversion.markup, "h1. Hello\n\n*Bold* text");
//! assert_eq!(conversion.metadata.title, "Hello");
//! ```

mod backend;
mod builder;
mod confluence;
mod context;
mod converter;
mod document;
mod error;
mod fence;
mod jira;
mod metadata;
mod placeholder;
mod preprocess;
mod renderer;
mod tree;
mod util;

pub use backend::{
    FootnoteEntry, ItemBlock, ItemBlockKind, MathPlacement, RenderBackend, RenderedCell,
    RenderedItem, RenderedList,
};
pub use builder::build;
pub use confluence::ConfluenceBackend;
pub use context::{RenderContext, RenderOptions};
pub use converter::{Conversion, Dialect, convert, convert_batch, convert_with};
pub use document::{Document, FrontMatter};
pub use error::{ConvertError, Warning};
pub use jira::JiraBackend;
pub use metadata::{
    DEFAULT_TITLE, PublishMetadata, before_estimate, estimate_from_body, extract, first_h1,
};
pub use placeholder::{Placeholders, restore};
pub use preprocess::{Preprocessed, preprocess};
pub use renderer::{MarkupRenderer, RenderResult};
pub use tree::{
    AlertKind, Alignment, Block, Cell, EmphasisStyle, Inline, List, ListItem, NodeTree, Row,
    Table, plain_text,
};
pub use util::{escape_xml, title_from_stem};
