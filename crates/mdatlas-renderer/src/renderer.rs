//! Generic tree walker with pluggable backend.

use std::marker::PhantomData;

use crate::backend::{
    FootnoteEntry, ItemBlock, ItemBlockKind, MathPlacement, RenderBackend, RenderedCell,
    RenderedItem, RenderedList,
};
use crate::context::RenderContext;
use crate::error::Warning;
use crate::placeholder::Placeholders;
use crate::tree::{Block, Inline, List, NodeTree, Table};

/// Result of rendering a node tree.
#[derive(Debug)]
pub struct RenderResult {
    /// Rendered markup, still carrying placeholder tokens.
    pub markup: String,
    /// Tokens the markup is expected to contain.
    pub placeholders: Placeholders,
    /// Constructs that were degraded.
    pub warnings: Vec<Warning>,
}

/// Recursive visitor rendering a [`NodeTree`] through backend `B`.
///
/// Children are rendered before their parent, so backends receive finished
/// content. Footnote definitions are pulled out of the main flow and
/// rendered as a trailing section.
pub struct MarkupRenderer<B: RenderBackend> {
    ctx: RenderContext,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkupRenderer<B> {
    #[must_use]
    pub fn new(ctx: RenderContext) -> Self {
        Self {
            ctx,
            _backend: PhantomData,
        }
    }

    /// Render `tree`, consuming the renderer and its context.
    #[must_use]
    pub fn render(mut self, tree: &NodeTree) -> RenderResult {
        let mut definitions = Vec::new();
        collect_definitions(&tree.blocks, &mut definitions);

        let mut markup = self.render_blocks(&tree.blocks);
        self.render_footnotes(&definitions, &mut markup);

        let (placeholders, warnings) = self.ctx.into_parts();
        RenderResult {
            markup: B::finish(markup),
            placeholders,
            warnings,
        }
    }

    fn render_blocks(&mut self, blocks: &[Block]) -> String {
        let mut out = String::new();
        for block in blocks {
            if matches!(block, Block::FootnoteDefinition { .. }) {
                continue;
            }
            let rendered = self.render_block(block);
            if rendered.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str(B::BLOCK_SEPARATOR);
            }
            out.push_str(&rendered);
        }
        out
    }

    fn render_block(&mut self, block: &Block) -> String {
        let mut out = String::new();
        match block {
            Block::Heading { level, content } => {
                let content = self.render_inlines(content);
                B::heading(*level, &content, &mut out);
            }
            Block::Paragraph(content) => {
                let content = self.render_inlines(content);
                B::paragraph(&content, &mut out);
            }
            Block::Plain(content) => {
                let content = self.render_inlines(content);
                B::plain(&content, &mut out);
            }
            Block::CodeBlock { language, text } => {
                B::code_block(language.as_deref(), text, &mut out);
            }
            Block::List(list) => self.render_list(list, &mut out),
            Block::Table(table) => self.render_table(table, &mut out),
            Block::Blockquote {
                kind,
                depth,
                blocks,
            } => {
                let content = self.render_blocks(blocks);
                B::blockquote(*kind, *depth, &content, &mut self.ctx, &mut out);
            }
            Block::Math(latex) => B::math(latex, MathPlacement::Block, &self.ctx, &mut out),
            Block::HorizontalRule => B::horizontal_rule(&mut out),
            Block::FootnoteDefinition { .. } => {}
            Block::Html(raw) => B::unsupported_block("HTML block", raw, &mut self.ctx, &mut out),
        }
        out
    }

    fn render_inlines(&mut self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            self.render_inline(inline, &mut out);
        }
        out
    }

    fn render_inline(&mut self, inline: &Inline, out: &mut String) {
        match inline {
            Inline::Text(text) => B::text(text, &self.ctx, out),
            Inline::Emphasis { style, content } => {
                let content = self.render_inlines(content);
                B::emphasis(*style, &content, out);
            }
            Inline::Code(code) => B::code_span(code, out),
            Inline::Link {
                href,
                title,
                content,
            } => {
                let outer = self.ctx.set_in_link(true);
                let content = self.render_inlines(content);
                self.ctx.set_in_link(outer);
                B::link(href, title.as_deref(), &content, out);
            }
            Inline::Image { src, alt, title } => B::image(src, alt, title.as_deref(), out),
            Inline::FootnoteReference(id) => {
                let number = self.ctx.footnotes.reference(id);
                B::footnote_reference(number, out);
            }
            Inline::Math { latex, .. } => B::math(latex, MathPlacement::Inline, &self.ctx, out),
            Inline::SoftBreak => B::soft_break(&self.ctx, out),
            Inline::HardBreak => B::hard_break(&self.ctx, out),
            Inline::Html(raw) => B::unsupported_inline("inline HTML", raw, &mut self.ctx, out),
        }
    }

    fn render_list(&mut self, list: &List, out: &mut String) {
        self.ctx.enter_list(list.ordered);

        let mut items = Vec::with_capacity(list.items.len());
        for item in &list.items {
            let mut blocks = Vec::with_capacity(item.blocks.len());
            for block in &item.blocks {
                if matches!(block, Block::FootnoteDefinition { .. }) {
                    continue;
                }
                blocks.push(self.render_item_block(block));
            }
            items.push(RenderedItem {
                task: item.task,
                blocks,
            });
        }

        let rendered = RenderedList {
            ordered: list.ordered,
            start: list.start,
            items,
        };
        B::list(&rendered, &self.ctx, out);
        self.ctx.exit_list();
    }

    fn render_item_block(&mut self, block: &Block) -> ItemBlock {
        let kind = match block {
            Block::Paragraph(_) | Block::Plain(_) => ItemBlockKind::Text,
            Block::List(_) => ItemBlockKind::List,
            _ => ItemBlockKind::Other,
        };
        ItemBlock {
            kind,
            markup: self.render_block(block),
        }
    }

    fn render_table(&mut self, table: &Table, out: &mut String) {
        self.ctx.set_in_table(true);
        let mut rows = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut cells = Vec::with_capacity(row.cells.len());
            for cell in &row.cells {
                cells.push(RenderedCell {
                    header: cell.header,
                    alignment: cell.alignment,
                    markup: self.render_inlines(&cell.content),
                });
            }
            rows.push(cells);
        }
        self.ctx.set_in_table(false);
        B::table(&rows, out);
    }

    /// Render footnotes in reference order, then unreferenced definitions.
    fn render_footnotes(&mut self, definitions: &[(&str, &[Block])], out: &mut String) {
        if definitions.is_empty() && self.ctx.footnotes.is_empty() {
            return;
        }

        self.ctx.set_in_footnote(true);
        let mut entries = Vec::new();
        let mut index = 0;
        let mut unreferenced_added = false;

        loop {
            // Rendering a definition may register further references.
            let Some(id) = self.ctx.footnotes.id(index).map(str::to_owned) else {
                if unreferenced_added {
                    break;
                }
                unreferenced_added = true;
                for (id, _) in definitions {
                    self.ctx.footnotes.reference(id);
                }
                continue;
            };

            let blocks = match definitions.iter().find(|(defined, _)| *defined == id) {
                Some((_, blocks)) => blocks
                    .iter()
                    .filter(|block| !matches!(block, Block::FootnoteDefinition { .. }))
                    .map(|block| self.render_item_block(block))
                    .collect(),
                None => {
                    self.ctx.warn(Warning::unsupported(
                        format!("footnote reference `{id}` without definition"),
                        "its label",
                    ));
                    let mut text = String::new();
                    B::text(&id, &self.ctx, &mut text);
                    let mut paragraph = String::new();
                    B::paragraph(&text, &mut paragraph);
                    vec![ItemBlock {
                        kind: ItemBlockKind::Text,
                        markup: paragraph,
                    }]
                }
            };

            index += 1;
            entries.push(FootnoteEntry {
                number: index,
                blocks,
            });
        }
        self.ctx.set_in_footnote(false);

        if !out.is_empty() {
            out.push_str(B::BLOCK_SEPARATOR);
        }
        B::footnotes(&entries, &mut self.ctx, out);
    }
}

/// Collect footnote definitions in document order; the first definition of
/// an id wins.
fn collect_definitions<'a>(blocks: &'a [Block], found: &mut Vec<(&'a str, &'a [Block])>) {
    for block in blocks {
        match block {
            Block::FootnoteDefinition { id, blocks } => {
                if !found.iter().any(|(existing, _)| *existing == id.as_str()) {
                    found.push((id.as_str(), blocks.as_slice()));
                }
                collect_definitions(blocks, found);
            }
            Block::Blockquote { blocks, .. } => collect_definitions(blocks, found),
            Block::List(list) => {
                for item in &list.items {
                    collect_definitions(&item.blocks, found);
                }
            }
            _ => {}
        }
    }
}
