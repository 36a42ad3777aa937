//! Render backend trait for dialect-specific output.
//!
//! The generic [`MarkupRenderer`](crate::MarkupRenderer) walks the node tree
//! and renders children first; a backend only decides how each node wraps
//! its already-rendered content. Adding a dialect means implementing this
//! trait, nothing else.

use crate::context::RenderContext;
use crate::error::Warning;
use crate::tree::{AlertKind, Alignment, EmphasisStyle};

/// Where a math span sits in the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathPlacement {
    /// Inside running text.
    Inline,
    /// A paragraph of its own.
    Block,
}

/// A list whose items have been rendered.
#[derive(Debug)]
pub struct RenderedList {
    pub ordered: bool,
    pub start: u64,
    pub items: Vec<RenderedItem>,
}

#[derive(Debug)]
pub struct RenderedItem {
    pub task: Option<bool>,
    pub blocks: Vec<ItemBlock>,
}

/// One rendered block inside a list item.
#[derive(Debug)]
pub struct ItemBlock {
    pub kind: ItemBlockKind,
    pub markup: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemBlockKind {
    /// Paragraph or tight inline run.
    Text,
    /// Nested list.
    List,
    /// Any other block (code, table, quote, ...).
    Other,
}

#[derive(Debug)]
pub struct RenderedCell {
    pub header: bool,
    pub alignment: Alignment,
    pub markup: String,
}

/// A numbered footnote with its rendered blocks.
#[derive(Debug)]
pub struct FootnoteEntry {
    pub number: usize,
    pub blocks: Vec<ItemBlock>,
}

/// Backend trait for dialect-specific rendering operations.
///
/// Every function writes into `out`. Content arguments are already rendered
/// markup in the backend's own dialect; text arguments (`code`, `href`,
/// `latex`, ...) are raw and must be escaped by the backend.
pub trait RenderBackend {
    /// Written between consecutive blocks of the same container.
    const BLOCK_SEPARATOR: &'static str;

    /// Render a run of plain text.
    fn text(text: &str, ctx: &RenderContext, out: &mut String);

    /// Render a backslash-escaped source character as plain text.
    ///
    /// Used when placeholder tokens are restored after rendering.
    fn literal(literal: char, out: &mut String);

    fn heading(level: u8, content: &str, out: &mut String);

    fn paragraph(content: &str, out: &mut String);

    /// Render the inline run of a tight list item.
    fn plain(content: &str, out: &mut String) {
        out.push_str(content);
    }

    fn code_block(language: Option<&str>, code: &str, out: &mut String);

    fn code_span(code: &str, out: &mut String);

    fn emphasis(style: EmphasisStyle, content: &str, out: &mut String);

    fn link(href: &str, title: Option<&str>, content: &str, out: &mut String);

    fn image(src: &str, alt: &str, title: Option<&str>, out: &mut String);

    /// Render a list. `ctx.list_depth()` is the depth of this list.
    fn list(list: &RenderedList, ctx: &RenderContext, out: &mut String);

    /// Render a table. Row and cell counts must be preserved.
    fn table(rows: &[Vec<RenderedCell>], out: &mut String);

    fn blockquote(
        kind: Option<AlertKind>,
        depth: usize,
        content: &str,
        ctx: &mut RenderContext,
        out: &mut String,
    );

    fn math(latex: &str, placement: MathPlacement, ctx: &RenderContext, out: &mut String);

    fn footnote_reference(number: usize, out: &mut String);

    /// Render the trailing footnote section. Not called when there are none.
    fn footnotes(entries: &[FootnoteEntry], ctx: &mut RenderContext, out: &mut String);

    fn horizontal_rule(out: &mut String);

    fn hard_break(ctx: &RenderContext, out: &mut String);

    fn soft_break(ctx: &RenderContext, out: &mut String);

    /// Render a block the dialect cannot express.
    ///
    /// Default renders `raw` as a paragraph of plain text and records a warning.
    fn unsupported_block(construct: &str, raw: &str, ctx: &mut RenderContext, out: &mut String) {
        ctx.warn(Warning::unsupported(construct, "plain text paragraph"));
        let mut content = String::new();
        Self::text(raw, ctx, &mut content);
        Self::paragraph(&content, out);
    }

    /// Render an inline construct the dialect cannot express.
    ///
    /// Default renders `raw` as plain text and records a warning.
    fn unsupported_inline(construct: &str, raw: &str, ctx: &mut RenderContext, out: &mut String) {
        ctx.warn(Warning::unsupported(construct, "plain text"));
        Self::text(raw, ctx, out);
    }

    /// Post-process the complete document.
    fn finish(markup: String) -> String {
        markup
    }
}
