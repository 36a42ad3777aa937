//! Placeholder tokens for backslash-escaped literals.
//!
//! The pre-processor swaps every `\X` escape for a token of the shape
//! `U+E000 <id> U+E001`, so neither the Markdown engine nor a render backend
//! can reinterpret the character. Tokens that end up in code, math or URLs
//! are settled by the tree builder; everything still registered afterwards
//! must appear in the rendered output and is restored by [`restore`].

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConvertError;

/// First code point of a token.
pub(crate) const TOKEN_OPEN: char = '\u{E000}';
/// Last code point of a token.
pub(crate) const TOKEN_CLOSE: char = '\u{E001}';

/// Ordered registry mapping placeholder tokens to the literals they replace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Placeholders {
    entries: BTreeMap<usize, char>,
    next_id: usize,
}

impl Placeholders {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a literal and return the token standing in for it.
    pub(crate) fn insert(&mut self, literal: char) -> String {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, literal);
        token(id)
    }

    /// Number of tokens still awaiting restoration.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tokens await restoration.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered `(token, literal)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (String, char)> + '_ {
        self.entries.iter().map(|(&id, &literal)| (token(id), literal))
    }

    /// Replace tokens in `text` with their escaped source form (`\X`) and
    /// retire them.
    ///
    /// Used for verbatim contexts (code, math, autolinks) where the Markdown
    /// engine would have kept the backslash.
    pub(crate) fn settle_verbatim(&mut self, text: &str) -> String {
        self.settle(text, true)
    }

    /// Replace tokens in `text` with the bare literal and retire them.
    ///
    /// Used for attribute-like values (link destinations, titles) that the
    /// Markdown engine unescapes.
    pub(crate) fn settle_literal(&mut self, text: &str) -> String {
        self.settle(text, false)
    }

    fn settle(&mut self, text: &str, keep_backslash: bool) -> String {
        if !text.contains(TOKEN_OPEN) {
            return text.to_owned();
        }

        let mut out = String::with_capacity(text.len());
        for piece in Pieces::new(text) {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Token { raw, id } => match self.entries.remove(&id) {
                    Some(literal) => {
                        if keep_backslash {
                            out.push('\\');
                        }
                        out.push(literal);
                    }
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

/// Substitute every registered token in `rendered` with its literal.
///
/// `render_literal` writes a literal in the form the target dialect reads as
/// plain text.
///
/// # Errors
///
/// Returns [`ConvertError::PlaceholderMismatch`] if a registered token is
/// absent from `rendered`, or if `rendered` holds a token that was never
/// registered.
pub fn restore(
    rendered: &str,
    placeholders: &Placeholders,
    render_literal: fn(char, &mut String),
) -> Result<String, ConvertError> {
    if placeholders.is_empty() && !rendered.contains(TOKEN_OPEN) {
        return Ok(rendered.to_owned());
    }

    let mut out = String::with_capacity(rendered.len());
    let mut seen = BTreeSet::new();
    let mut unknown = Vec::new();

    for piece in Pieces::new(rendered) {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Token { raw, id } => match placeholders.entries.get(&id) {
                Some(&literal) => {
                    render_literal(literal, &mut out);
                    seen.insert(id);
                }
                None => unknown.push(raw.to_owned()),
            },
        }
    }

    let missing: Vec<char> = placeholders
        .entries
        .iter()
        .filter(|(id, _)| !seen.contains(*id))
        .map(|(_, &literal)| literal)
        .collect();

    if missing.is_empty() && unknown.is_empty() {
        Ok(out)
    } else {
        Err(ConvertError::PlaceholderMismatch { missing, unknown })
    }
}

fn token(id: usize) -> String {
    format!("{TOKEN_OPEN}{id}{TOKEN_CLOSE}")
}

enum Piece<'a> {
    Text(&'a str),
    Token { raw: &'a str, id: usize },
}

/// Splits a string into plain runs and well-formed tokens.
struct Pieces<'a> {
    rest: &'a str,
}

impl<'a> Pieces<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Piece<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        if let Some((len, id)) = token_at(self.rest) {
            let (raw, rest) = self.rest.split_at(len);
            self.rest = rest;
            return Some(Piece::Token { raw, id });
        }

        // A stray TOKEN_OPEN at the front is plain text; look past it.
        let skip = self.rest.chars().next().map_or(0, char::len_utf8);
        let end = self.rest[skip..]
            .find(TOKEN_OPEN)
            .map_or(self.rest.len(), |pos| pos + skip);
        let (text, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(Piece::Text(text))
    }
}

/// Parse a token at the start of `s`, returning its byte length and id.
fn token_at(s: &str) -> Option<(usize, usize)> {
    let body = s.strip_prefix(TOKEN_OPEN)?;
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !body[digits..].starts_with(TOKEN_CLOSE) {
        return None;
    }
    let id = body[..digits].parse().ok()?;
    Some((TOKEN_OPEN.len_utf8() + digits + TOKEN_CLOSE.len_utf8(), id))
}
