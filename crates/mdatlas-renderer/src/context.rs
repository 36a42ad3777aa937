//! Per-conversion render state.

use std::collections::HashMap;

use crate::error::Warning;
use crate::placeholder::Placeholders;

/// Options controlling how a document is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit math macros instead of plain LaTeX text.
    pub enable_math: bool,
    /// Render soft line breaks as hard breaks (Confluence).
    pub preserve_line_breaks: bool,
    /// Drop the first level-1 heading from the body.
    pub strip_title: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            enable_math: false,
            preserve_line_breaks: true,
            strip_title: false,
        }
    }
}

/// Footnote ids numbered in order of first reference.
#[derive(Debug, Default)]
pub(crate) struct FootnoteRegistry {
    numbers: HashMap<String, usize>,
    order: Vec<String>,
}

impl FootnoteRegistry {
    /// Number for `id`, registering it on first use.
    pub(crate) fn reference(&mut self, id: &str) -> usize {
        if let Some(&number) = self.numbers.get(id) {
            return number;
        }
        self.order.push(id.to_owned());
        let number = self.order.len();
        self.numbers.insert(id.to_owned(), number);
        number
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Id registered with number `index + 1`.
    pub(crate) fn id(&self, index: usize) -> Option<&str> {
        self.order.get(index).map(String::as_str)
    }
}

/// Mutable state carried through one tree walk.
///
/// Owns the placeholder registry and collects warnings. A context is used
/// for exactly one render and discarded afterwards.
#[derive(Debug)]
pub struct RenderContext {
    options: RenderOptions,
    placeholders: Placeholders,
    pub(crate) footnotes: FootnoteRegistry,
    /// Ordered flag of every open list, outermost first.
    list_stack: Vec<bool>,
    in_table: bool,
    in_link: bool,
    in_footnote: bool,
    warnings: Vec<Warning>,
}

impl RenderContext {
    #[must_use]
    pub fn new(options: RenderOptions, placeholders: Placeholders) -> Self {
        Self {
            options,
            placeholders,
            footnotes: FootnoteRegistry::default(),
            list_stack: Vec::new(),
            in_table: false,
            in_link: false,
            in_footnote: false,
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    /// Depth of the innermost open list, 0 outside lists.
    pub fn list_depth(&self) -> usize {
        self.list_stack.len()
    }

    /// Whether the outermost open list is ordered.
    pub fn root_list_ordered(&self) -> bool {
        self.list_stack.first().copied().unwrap_or(false)
    }

    pub fn in_table(&self) -> bool {
        self.in_table
    }

    /// Whether text is being rendered as link content.
    pub fn in_link(&self) -> bool {
        self.in_link
    }

    /// Whether output must stay on one line (list items, table cells, footnotes).
    pub fn single_line(&self) -> bool {
        !self.list_stack.is_empty() || self.in_table || self.in_footnote
    }

    /// Record a non-fatal diagnostic.
    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn enter_list(&mut self, ordered: bool) {
        self.list_stack.push(ordered);
    }

    pub(crate) fn exit_list(&mut self) {
        self.list_stack.pop();
    }

    pub(crate) fn set_in_table(&mut self, in_table: bool) {
        self.in_table = in_table;
    }

    /// Set the link flag, returning its previous value.
    pub(crate) fn set_in_link(&mut self, in_link: bool) -> bool {
        std::mem::replace(&mut self.in_link, in_link)
    }

    pub(crate) fn set_in_footnote(&mut self, in_footnote: bool) {
        self.in_footnote = in_footnote;
    }

    pub(crate) fn into_parts(self) -> (Placeholders, Vec<Warning>) {
        (self.placeholders, self.warnings)
    }
}
