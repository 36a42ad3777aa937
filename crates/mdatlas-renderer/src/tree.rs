//! Dialect-agnostic node tree shared by all render backends.

/// Parsed document: an ordered sequence of blocks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTree {
    pub blocks: Vec<Block>,
}

/// Block-level node.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    /// Inline run of a tight list item, rendered without paragraph wrapping.
    Plain(Vec<Inline>),
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    List(List),
    Table(Table),
    Blockquote {
        kind: Option<AlertKind>,
        /// Nesting depth, 1 for an outermost quote.
        depth: usize,
        blocks: Vec<Block>,
    },
    /// Display math standing alone as a paragraph.
    Math(String),
    HorizontalRule,
    FootnoteDefinition {
        id: String,
        blocks: Vec<Block>,
    },
    /// Raw HTML block, which neither dialect can carry.
    Html(String),
}

/// Inline node.
#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text(String),
    Emphasis {
        style: EmphasisStyle,
        content: Vec<Inline>,
    },
    Code(String),
    Link {
        href: String,
        title: Option<String>,
        content: Vec<Inline>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    FootnoteReference(String),
    Math {
        latex: String,
        display: bool,
    },
    SoftBreak,
    HardBreak,
    Html(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmphasisStyle {
    Bold,
    Italic,
    BoldItalic,
    Strikethrough,
}

/// GitHub-style alert kind carried by a blockquote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl From<pulldown_cmark::BlockQuoteKind> for AlertKind {
    fn from(kind: pulldown_cmark::BlockQuoteKind) -> Self {
        match kind {
            pulldown_cmark::BlockQuoteKind::Note => Self::Note,
            pulldown_cmark::BlockQuoteKind::Tip => Self::Tip,
            pulldown_cmark::BlockQuoteKind::Important => Self::Important,
            pulldown_cmark::BlockQuoteKind::Warning => Self::Warning,
            pulldown_cmark::BlockQuoteKind::Caution => Self::Caution,
        }
    }
}

impl AlertKind {
    /// Display label ("Note", "Tip", ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Tip => "Tip",
            Self::Important => "Important",
            Self::Warning => "Warning",
            Self::Caution => "Caution",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub ordered: bool,
    /// First number of an ordered list.
    pub start: u64,
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListItem {
    /// Task marker state, `None` for plain items.
    pub task: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub alignment: Alignment,
    pub header: bool,
    pub content: Vec<Inline>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl From<pulldown_cmark::Alignment> for Alignment {
    fn from(alignment: pulldown_cmark::Alignment) -> Self {
        match alignment {
            pulldown_cmark::Alignment::None => Self::None,
            pulldown_cmark::Alignment::Left => Self::Left,
            pulldown_cmark::Alignment::Center => Self::Center,
            pulldown_cmark::Alignment::Right => Self::Right,
        }
    }
}

impl NodeTree {
    /// Remove the first level-1 heading and return its plain text.
    ///
    /// Only top-level headings are considered.
    pub fn take_title_heading(&mut self) -> Option<String> {
        let index = self
            .blocks
            .iter()
            .position(|block| matches!(block, Block::Heading { level: 1, .. }))?;
        match self.blocks.remove(index) {
            Block::Heading { content, .. } => Some(plain_text(&content)),
            _ => None,
        }
    }
}

/// Concatenate the textual content of inline nodes, dropping markup.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(inlines, &mut out);
    out
}

fn push_plain_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) | Inline::Html(text) => out.push_str(text),
            Inline::Emphasis { content, .. } | Inline::Link { content, .. } => {
                push_plain_text(content, out);
            }
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::FootnoteReference(id) => out.push_str(id),
            Inline::Math { latex, .. } => out.push_str(latex),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_owned())
    }

    #[test]
    fn test_plain_text_flattens_markup() {
        let inlines = vec![
            text("a "),
            Inline::Emphasis {
                style: EmphasisStyle::Bold,
                content: vec![text("b")],
            },
            Inline::SoftBreak,
            Inline::Code("c".to_owned()),
        ];
        assert_eq!(plain_text(&inlines), "a b c");
    }

    #[test]
    fn test_take_title_heading() {
        let mut tree = NodeTree {
            blocks: vec![
                Block::Paragraph(vec![text("intro")]),
                Block::Heading {
                    level: 1,
                    content: vec![text("Title")],
                },
                Block::Heading {
                    level: 1,
                    content: vec![text("Second")],
                },
            ],
        };
        assert_eq!(tree.take_title_heading().as_deref(), Some("Title"));
        assert_eq!(tree.blocks.len(), 2);
    }

    #[test]
    fn test_take_title_heading_absent() {
        let mut tree = NodeTree {
            blocks: vec![Block::Heading {
                level: 2,
                content: vec![text("Sub")],
            }],
        };
        assert_eq!(tree.take_title_heading(), None);
        assert_eq!(tree.blocks.len(), 1);
    }
}
