//! Folds the pulldown-cmark event stream into a [`NodeTree`].
//!
//! The builder keeps a stack of open frames. Block containers collect
//! finished blocks plus any loose inline run (tight list items emit text
//! without a paragraph), inline frames collect inline children. Closing a
//! frame hands its node to whatever frame is now on top.

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::error::ConvertError;
use crate::placeholder::Placeholders;
use crate::tree::{
    Alignment, AlertKind, Block, Cell, EmphasisStyle, Inline, List, ListItem, NodeTree, Row,
    Table, plain_text,
};
use crate::util::heading_level_to_num;

/// Markdown engine options.
///
/// Strikethrough and definition lists are left to the pre-processor. Math is
/// always parsed so that disabling it changes only the rendering.
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_MATH
}

/// Parse pre-processed Markdown into a node tree.
///
/// Placeholder tokens that land in verbatim or attribute contexts are settled
/// here and removed from `placeholders`.
pub fn build(markdown: &str, placeholders: &mut Placeholders) -> Result<NodeTree, ConvertError> {
    let mut stack = vec![Frame::Document(Container::default())];

    for event in Parser::new_ext(markdown, parser_options()) {
        match event {
            Event::Start(tag) => handle_start(tag, &mut stack, placeholders)?,
            Event::End(tag_end) => handle_end(tag_end, &mut stack, placeholders)?,
            Event::Text(text) => handle_text(&text, &mut stack)?,
            Event::Code(code) => {
                push_inline(&mut stack, Inline::Code(placeholders.settle_verbatim(&code)))?;
            }
            Event::InlineMath(latex) => push_math(&mut stack, placeholders, &latex, false)?,
            Event::DisplayMath(latex) => push_math(&mut stack, placeholders, &latex, true)?,
            Event::Html(html) => handle_text(&html, &mut stack)?,
            Event::InlineHtml(html) => handle_inline_html(&html, &mut stack)?,
            Event::FootnoteReference(label) => {
                let id = placeholders.settle_literal(&label);
                push_inline(&mut stack, Inline::FootnoteReference(id))?;
            }
            Event::SoftBreak => push_inline(&mut stack, Inline::SoftBreak)?,
            Event::HardBreak => push_inline(&mut stack, Inline::HardBreak)?,
            Event::Rule => push_block(&mut stack, Block::HorizontalRule)?,
            Event::TaskListMarker(checked) => mark_task(&mut stack, checked)?,
        }
    }

    finish_stack(stack)
}

/// Block container state: finished blocks plus a pending inline run.
#[derive(Debug, Default)]
struct Container {
    blocks: Vec<Block>,
    pending: Vec<Inline>,
}

impl Container {
    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            let inlines = std::mem::take(&mut self.pending);
            self.blocks.push(Block::Plain(inlines));
        }
    }

    fn push_block(&mut self, block: Block) {
        self.flush_pending();
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_pending();
        self.blocks
    }
}

#[derive(Debug)]
enum Frame {
    Document(Container),
    Blockquote {
        kind: Option<AlertKind>,
        depth: usize,
        container: Container,
    },
    List {
        ordered: bool,
        start: u64,
        items: Vec<ListItem>,
    },
    Item {
        task: Option<bool>,
        container: Container,
    },
    FootnoteDefinition {
        id: String,
        container: Container,
    },
    /// Transparent block group whose children splice into the parent.
    Group(Container),
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    HtmlBlock(String),
    Table {
        alignments: Vec<Alignment>,
        rows: Vec<Row>,
    },
    TableRow {
        header: bool,
        cells: Vec<Cell>,
    },
    TableCell(Vec<Inline>),
    Emphasis {
        style: EmphasisStyle,
        content: Vec<Inline>,
    },
    /// Strikethrough opened by a `<del>` tag from the pre-processor.
    Strike(Vec<Inline>),
    Link {
        href: String,
        title: Option<String>,
        content: Vec<Inline>,
    },
    Image {
        src: String,
        title: Option<String>,
        content: Vec<Inline>,
    },
    /// Transparent inline span whose children splice into the parent.
    Span(Vec<Inline>),
    Metadata,
}

fn finish_stack(mut stack: Vec<Frame>) -> Result<NodeTree, ConvertError> {
    if stack.len() != 1 {
        return Err(ConvertError::parse("unbalanced markdown structure"));
    }

    match stack.pop() {
        Some(Frame::Document(container)) => Ok(NodeTree {
            blocks: container.finish(),
        }),
        _ => Err(ConvertError::parse(
            "unexpected parser state at end of document",
        )),
    }
}

#[allow(clippy::too_many_lines)]
fn handle_start(
    tag: Tag<'_>,
    stack: &mut Vec<Frame>,
    placeholders: &mut Placeholders,
) -> Result<(), ConvertError> {
    match tag {
        Tag::Paragraph | Tag::DefinitionListTitle => {
            flush_pending(stack);
            stack.push(Frame::Paragraph(Vec::new()));
        }
        Tag::Heading { level, .. } => {
            flush_pending(stack);
            stack.push(Frame::Heading {
                level: heading_level_to_num(level),
                content: Vec::new(),
            });
        }
        Tag::BlockQuote(kind) => {
            flush_pending(stack);
            let depth = 1 + stack
                .iter()
                .filter(|frame| matches!(frame, Frame::Blockquote { .. }))
                .count();
            stack.push(Frame::Blockquote {
                kind: kind.map(AlertKind::from),
                depth,
                container: Container::default(),
            });
        }
        Tag::CodeBlock(kind) => {
            flush_pending(stack);
            let language = match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(str::to_owned),
                CodeBlockKind::Indented => None,
            };
            stack.push(Frame::CodeBlock {
                language,
                text: String::new(),
            });
        }
        Tag::HtmlBlock => {
            flush_pending(stack);
            stack.push(Frame::HtmlBlock(String::new()));
        }
        Tag::List(start) => {
            flush_pending(stack);
            stack.push(Frame::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
                items: Vec::new(),
            });
        }
        Tag::Item => stack.push(Frame::Item {
            task: None,
            container: Container::default(),
        }),
        Tag::FootnoteDefinition(label) => {
            flush_pending(stack);
            stack.push(Frame::FootnoteDefinition {
                id: placeholders.settle_literal(&label),
                container: Container::default(),
            });
        }
        Tag::DefinitionList | Tag::DefinitionListDefinition => {
            flush_pending(stack);
            stack.push(Frame::Group(Container::default()));
        }
        Tag::Table(alignments) => {
            flush_pending(stack);
            stack.push(Frame::Table {
                alignments: alignments.into_iter().map(Alignment::from).collect(),
                rows: Vec::new(),
            });
        }
        Tag::TableHead => stack.push(Frame::TableRow {
            header: true,
            cells: Vec::new(),
        }),
        Tag::TableRow => stack.push(Frame::TableRow {
            header: false,
            cells: Vec::new(),
        }),
        Tag::TableCell => stack.push(Frame::TableCell(Vec::new())),
        Tag::Emphasis => stack.push(Frame::Emphasis {
            style: EmphasisStyle::Italic,
            content: Vec::new(),
        }),
        Tag::Strong => stack.push(Frame::Emphasis {
            style: EmphasisStyle::Bold,
            content: Vec::new(),
        }),
        Tag::Strikethrough => stack.push(Frame::Emphasis {
            style: EmphasisStyle::Strikethrough,
            content: Vec::new(),
        }),
        Tag::Superscript | Tag::Subscript => stack.push(Frame::Span(Vec::new())),
        Tag::Link {
            link_type,
            dest_url,
            title,
            ..
        } => {
            // Autolinks keep backslashes; other destinations are unescaped.
            let href = if matches!(link_type, LinkType::Autolink | LinkType::Email) {
                placeholders.settle_verbatim(&dest_url)
            } else {
                placeholders.settle_literal(&dest_url)
            };
            stack.push(Frame::Link {
                href,
                title: non_empty(placeholders.settle_literal(&title)),
                content: Vec::new(),
            });
        }
        Tag::Image {
            dest_url, title, ..
        } => stack.push(Frame::Image {
            src: placeholders.settle_literal(&dest_url),
            title: non_empty(placeholders.settle_literal(&title)),
            content: Vec::new(),
        }),
        Tag::MetadataBlock(_) => stack.push(Frame::Metadata),
    }
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn handle_end(
    tag_end: TagEnd,
    stack: &mut Vec<Frame>,
    placeholders: &mut Placeholders,
) -> Result<(), ConvertError> {
    close_open_strikes(stack)?;

    match tag_end {
        TagEnd::Paragraph | TagEnd::DefinitionListTitle => {
            let Some(Frame::Paragraph(inlines)) = stack.pop() else {
                return Err(ConvertError::parse("paragraph mismatch"));
            };
            push_block(stack, paragraph_block(inlines))?;
        }
        TagEnd::Heading(_) => {
            let Some(Frame::Heading { level, content }) = stack.pop() else {
                return Err(ConvertError::parse("heading mismatch"));
            };
            push_block(stack, Block::Heading { level, content })?;
        }
        TagEnd::BlockQuote(_) => {
            let Some(Frame::Blockquote {
                kind,
                depth,
                container,
            }) = stack.pop()
            else {
                return Err(ConvertError::parse("blockquote mismatch"));
            };
            push_block(
                stack,
                Block::Blockquote {
                    kind,
                    depth,
                    blocks: container.finish(),
                },
            )?;
        }
        TagEnd::CodeBlock => {
            let Some(Frame::CodeBlock { language, text }) = stack.pop() else {
                return Err(ConvertError::parse("code block mismatch"));
            };
            let text = text.strip_suffix('\n').unwrap_or(&text);
            push_block(
                stack,
                Block::CodeBlock {
                    language,
                    text: placeholders.settle_verbatim(text),
                },
            )?;
        }
        TagEnd::HtmlBlock => {
            let Some(Frame::HtmlBlock(html)) = stack.pop() else {
                return Err(ConvertError::parse("html block mismatch"));
            };
            push_block(stack, Block::Html(html.trim_end().to_owned()))?;
        }
        TagEnd::List(_) => {
            let Some(Frame::List {
                ordered,
                start,
                items,
            }) = stack.pop()
            else {
                return Err(ConvertError::parse("list mismatch"));
            };
            push_block(
                stack,
                Block::List(List {
                    ordered,
                    start,
                    items,
                }),
            )?;
        }
        TagEnd::Item => {
            let Some(Frame::Item { task, container }) = stack.pop() else {
                return Err(ConvertError::parse("list item mismatch"));
            };
            let Some(Frame::List { items, .. }) = stack.last_mut() else {
                return Err(ConvertError::parse("list item outside list"));
            };
            items.push(ListItem {
                task,
                blocks: container.finish(),
            });
        }
        TagEnd::FootnoteDefinition => {
            let Some(Frame::FootnoteDefinition { id, container }) = stack.pop() else {
                return Err(ConvertError::parse("footnote definition mismatch"));
            };
            push_block(
                stack,
                Block::FootnoteDefinition {
                    id,
                    blocks: container.finish(),
                },
            )?;
        }
        TagEnd::DefinitionList | TagEnd::DefinitionListDefinition => {
            let Some(Frame::Group(container)) = stack.pop() else {
                return Err(ConvertError::parse("definition list mismatch"));
            };
            for block in container.finish() {
                push_block(stack, block)?;
            }
        }
        TagEnd::Table => {
            let Some(Frame::Table { rows, .. }) = stack.pop() else {
                return Err(ConvertError::parse("table mismatch"));
            };
            push_block(stack, Block::Table(Table { rows }))?;
        }
        TagEnd::TableHead | TagEnd::TableRow => {
            let Some(Frame::TableRow { cells, .. }) = stack.pop() else {
                return Err(ConvertError::parse("table row mismatch"));
            };
            let Some(Frame::Table { rows, .. }) = stack.last_mut() else {
                return Err(ConvertError::parse("table row outside table"));
            };
            rows.push(Row { cells });
        }
        TagEnd::TableCell => {
            let Some(Frame::TableCell(content)) = stack.pop() else {
                return Err(ConvertError::parse("table cell mismatch"));
            };
            let alignment = cell_alignment(stack);
            let Some(Frame::TableRow { header, cells }) = stack.last_mut() else {
                return Err(ConvertError::parse("table cell outside row"));
            };
            cells.push(Cell {
                alignment,
                header: *header,
                content,
            });
        }
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
            let Some(Frame::Emphasis { style, content }) = stack.pop() else {
                return Err(ConvertError::parse("emphasis mismatch"));
            };
            push_inline(stack, emphasis(style, content))?;
        }
        TagEnd::Superscript | TagEnd::Subscript => {
            let Some(Frame::Span(content)) = stack.pop() else {
                return Err(ConvertError::parse("span mismatch"));
            };
            for inline in content {
                push_inline(stack, inline)?;
            }
        }
        TagEnd::Link => {
            let Some(Frame::Link {
                href,
                title,
                content,
            }) = stack.pop()
            else {
                return Err(ConvertError::parse("link mismatch"));
            };
            push_inline(
                stack,
                Inline::Link {
                    href,
                    title,
                    content,
                },
            )?;
        }
        TagEnd::Image => {
            let Some(Frame::Image {
                src,
                title,
                content,
            }) = stack.pop()
            else {
                return Err(ConvertError::parse("image mismatch"));
            };
            push_inline(
                stack,
                Inline::Image {
                    src,
                    alt: plain_text(&content),
                    title,
                },
            )?;
        }
        TagEnd::MetadataBlock(_) => {
            let Some(Frame::Metadata) = stack.pop() else {
                return Err(ConvertError::parse("metadata block mismatch"));
            };
        }
    }
    Ok(())
}

fn handle_text(text: &str, stack: &mut [Frame]) -> Result<(), ConvertError> {
    match stack.last_mut() {
        Some(Frame::CodeBlock { text: buffer, .. } | Frame::HtmlBlock(buffer)) => {
            buffer.push_str(text);
            Ok(())
        }
        Some(Frame::Metadata) => Ok(()),
        _ => push_inline(stack, Inline::Text(text.to_owned())),
    }
}

fn handle_inline_html(html: &str, stack: &mut Vec<Frame>) -> Result<(), ConvertError> {
    let tag = html.trim().to_ascii_lowercase();
    match tag.as_str() {
        "<del>" => {
            stack.push(Frame::Strike(Vec::new()));
            Ok(())
        }
        "</del>" => {
            // A close with no matching open was already auto-closed; drop it.
            if let Some(Frame::Strike(content)) =
                stack.pop_if(|frame| matches!(frame, Frame::Strike(_)))
            {
                push_inline(stack, emphasis(EmphasisStyle::Strikethrough, content))?;
            }
            Ok(())
        }
        "<br>" | "<br/>" | "<br />" => push_inline(stack, Inline::HardBreak),
        _ => push_inline(stack, Inline::Html(html.to_owned())),
    }
}

fn push_math(
    stack: &mut [Frame],
    placeholders: &mut Placeholders,
    latex: &str,
    display: bool,
) -> Result<(), ConvertError> {
    let latex = placeholders.settle_verbatim(latex);
    let latex = if display {
        latex.trim().to_owned()
    } else {
        latex
    };
    push_inline(stack, Inline::Math { latex, display })
}

fn mark_task(stack: &mut [Frame], checked: bool) -> Result<(), ConvertError> {
    let item = stack.iter_mut().rev().find_map(|frame| match frame {
        Frame::Item { task, .. } => Some(task),
        _ => None,
    });
    match item {
        Some(task) => {
            *task = Some(checked);
            Ok(())
        }
        None => Err(ConvertError::parse("task marker outside list item")),
    }
}

/// Close `<del>` spans left open when their enclosing element ends.
fn close_open_strikes(stack: &mut Vec<Frame>) -> Result<(), ConvertError> {
    while let Some(Frame::Strike(content)) =
        stack.pop_if(|frame| matches!(frame, Frame::Strike(_)))
    {
        push_inline(stack, emphasis(EmphasisStyle::Strikethrough, content))?;
    }
    Ok(())
}

/// Build an emphasis node, merging strong-around-emphasis into bold-italic.
fn emphasis(style: EmphasisStyle, mut content: Vec<Inline>) -> Inline {
    if content.len() == 1
        && let Some(Inline::Emphasis {
            style: inner,
            content: inner_content,
        }) = content.first_mut()
    {
        let merged = matches!(
            (style, *inner),
            (EmphasisStyle::Bold, EmphasisStyle::Italic)
                | (EmphasisStyle::Italic, EmphasisStyle::Bold)
        );
        if merged {
            return Inline::Emphasis {
                style: EmphasisStyle::BoldItalic,
                content: std::mem::take(inner_content),
            };
        }
    }
    Inline::Emphasis { style, content }
}

/// A paragraph holding nothing but display math becomes a math block.
fn paragraph_block(inlines: Vec<Inline>) -> Block {
    if let [Inline::Math {
        latex,
        display: true,
    }] = inlines.as_slice()
    {
        return Block::Math(latex.clone());
    }
    Block::Paragraph(inlines)
}

fn cell_alignment(stack: &[Frame]) -> Alignment {
    let column = match stack.last() {
        Some(Frame::TableRow { cells, .. }) => cells.len(),
        _ => return Alignment::None,
    };
    stack
        .iter()
        .rev()
        .find_map(|frame| match frame {
            Frame::Table { alignments, .. } => {
                Some(alignments.get(column).copied().unwrap_or_default())
            }
            _ => None,
        })
        .unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn flush_pending(stack: &mut [Frame]) {
    if let Some(container) = stack.last_mut().and_then(container_mut) {
        container.flush_pending();
    }
}

fn container_mut(frame: &mut Frame) -> Option<&mut Container> {
    match frame {
        Frame::Document(container)
        | Frame::Blockquote { container, .. }
        | Frame::Item { container, .. }
        | Frame::FootnoteDefinition { container, .. }
        | Frame::Group(container) => Some(container),
        _ => None,
    }
}

fn push_block(stack: &mut [Frame], block: Block) -> Result<(), ConvertError> {
    match stack.last_mut().and_then(container_mut) {
        Some(container) => {
            container.push_block(block);
            Ok(())
        }
        None => Err(ConvertError::parse("block content outside a container")),
    }
}

fn push_inline(stack: &mut [Frame], inline: Inline) -> Result<(), ConvertError> {
    let target = match stack.last_mut() {
        Some(
            Frame::Paragraph(content)
            | Frame::Heading { content, .. }
            | Frame::TableCell(content)
            | Frame::Emphasis { content, .. }
            | Frame::Strike(content)
            | Frame::Link { content, .. }
            | Frame::Image { content, .. }
            | Frame::Span(content),
        ) => content,
        Some(frame) => match container_mut(frame) {
            Some(container) => &mut container.pending,
            None => return Err(ConvertError::parse("inline content outside a block")),
        },
        None => return Err(ConvertError::parse("inline content after end of document")),
    };

    if let (Inline::Text(text), Some(Inline::Text(last))) = (&inline, target.last_mut()) {
        last.push_str(text);
        return Ok(());
    }
    target.push(inline);
    Ok(())
}
