//! Text transforms applied before Markdown parsing.
//!
//! Three rewrites happen here, all skipping fenced code, display math,
//! inline code spans and inline math:
//!
//! - `~~text~~` on one line becomes `<del>text</del>`, which the tree builder
//!   folds into a strikethrough span.
//! - Definition lists (`Term` followed by `: definition` lines) become a bold
//!   term paragraph followed by a bullet list.
//! - Backslash escapes of ASCII punctuation become placeholder tokens, see
//!   [`Placeholders`].
//!
//! Link reference definitions and link or footnote labels are left as
//! written. The engine matches labels on their raw text and may use a
//! definition any number of times, or never.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::fence::VerbatimTracker;
use crate::placeholder::{Placeholders, TOKEN_CLOSE, TOKEN_OPEN};

/// `[label]: destination` at the start of a line.
static REFERENCE_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}\[((?:[^\\\[\]]|\\.)+)\]:")
        .expect("invalid reference definition regex")
});

/// Output of [`preprocess`].
#[derive(Debug)]
pub struct Preprocessed {
    /// Rewritten Markdown text.
    pub text: String,
    /// Tokens introduced while rewriting.
    pub placeholders: Placeholders,
}

/// Rewrite Markdown source ahead of parsing.
pub fn preprocess(markdown: &str) -> Preprocessed {
    let lines: Vec<&str> = markdown.lines().collect();
    let references = References::scan(&lines);
    let mut placeholders = Placeholders::new();
    let mut tracker = VerbatimTracker::new();
    let mut out = String::with_capacity(markdown.len() + 64);
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];

        if tracker.observe(line) || references.lines[index] {
            out.push_str(line);
            out.push('\n');
            index += 1;
            continue;
        }

        let starts_block = index == 0 || lines[index - 1].trim().is_empty();
        if starts_block
            && is_term_line(line)
            && lines.get(index + 1).is_some_and(|next| definition_text(next).is_some())
        {
            index = rewrite_definition_list(
                &lines,
                index,
                &references.labels,
                &mut placeholders,
                &mut out,
            );
            continue;
        }

        out.push_str(&rewrite_inline(line, &references.labels, &mut placeholders));
        out.push('\n');
        index += 1;
    }

    if !markdown.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }

    Preprocessed {
        text: out,
        placeholders,
    }
}

/// Link reference definitions found in a document.
#[derive(Debug, Default)]
struct References {
    /// Per line: whether it belongs to a definition.
    lines: Vec<bool>,
    /// Normalized labels of every definition.
    labels: HashSet<String>,
}

impl References {
    fn scan(lines: &[&str]) -> Self {
        let mut tracker = VerbatimTracker::new();
        let mut references = Self {
            lines: vec![false; lines.len()],
            labels: HashSet::new(),
        };
        // A definition cannot interrupt a paragraph, but may follow another.
        let mut after_definition = false;

        for (index, line) in lines.iter().enumerate() {
            if tracker.observe(line) {
                after_definition = false;
                continue;
            }
            let starts_block = index == 0 || lines[index - 1].trim().is_empty();
            let label = reference_label(line).filter(|_| starts_block || after_definition);
            if let Some(label) = label {
                references.labels.insert(normalize_label(label));
                references.lines[index] = true;
                after_definition = true;
            } else if after_definition && is_title_continuation(line) {
                references.lines[index] = true;
            } else {
                after_definition = false;
            }
        }
        references
    }
}

/// Label of a link reference definition line. Footnote definitions are not
/// link references.
fn reference_label(line: &str) -> Option<&str> {
    let label = REFERENCE_DEFINITION.captures(line)?.get(1)?.as_str();
    (!label.starts_with('^') && !label.trim().is_empty()).then_some(label)
}

/// A definition title written on the line after its destination.
fn is_title_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) && line.trim_start().starts_with(['"', '\'', '('])
}

/// Case-folded label with runs of whitespace collapsed.
fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Rewrite a term line and its definitions, returning the next line index.
fn rewrite_definition_list(
    lines: &[&str],
    term_index: usize,
    labels: &HashSet<String>,
    placeholders: &mut Placeholders,
    out: &mut String,
) -> usize {
    out.push_str("**");
    out.push_str(&rewrite_inline(lines[term_index].trim(), labels, placeholders));
    out.push_str("**\n\n");

    let mut index = term_index + 1;
    while let Some(definition) = lines.get(index).and_then(|line| definition_text(line)) {
        out.push_str("- ");
        out.push_str(&rewrite_inline(definition, labels, placeholders));
        out.push('\n');
        index += 1;
    }
    out.push('\n');
    index
}

fn is_term_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !line.starts_with([' ', '\t'])
        && !trimmed.starts_with(['#', '>', ':', '|', '-', '*', '+', '<', '!'])
}

/// Text of a `: definition` line, if `line` is one.
fn definition_text(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(':')?;
    let text = rest.strip_prefix([' ', '\t'])?.trim();
    (!text.is_empty()).then_some(text)
}

/// Apply strikethrough and escape rewriting to a single line.
fn rewrite_inline(line: &str, labels: &HashSet<String>, placeholders: &mut Placeholders) -> String {
    let mut out = String::with_capacity(line.len() + 16);
    let mut rest = line;
    let mut strike_open = false;
    let mut previous = None;

    while let Some(ch) = rest.chars().next() {
        let consumed = match ch {
            '`' => {
                let len = code_span_len(rest);
                out.push_str(&rest[..len]);
                len
            }
            '$' => {
                let len = math_span_len(rest).unwrap_or(1);
                out.push_str(&rest[..len]);
                len
            }
            '[' => {
                let len = raw_label_len(rest, previous == Some(']'), labels).unwrap_or(1);
                out.push_str(&rest[..len]);
                len
            }
            '\\' => match rest[1..].chars().next() {
                Some(escaped) if escaped.is_ascii_punctuation() => {
                    out.push_str(&placeholders.insert(escaped));
                    1 + escaped.len_utf8()
                }
                _ => {
                    out.push('\\');
                    1
                }
            },
            '~' if rest.starts_with("~~") => {
                if strike_open {
                    out.push_str("</del>");
                    strike_open = false;
                } else if rest[2..].find("~~").is_some_and(|pos| pos > 0) {
                    out.push_str("<del>");
                    strike_open = true;
                } else {
                    out.push_str("~~");
                }
                2
            }
            TOKEN_OPEN | TOKEN_CLOSE => {
                out.push_str(&placeholders.insert(ch));
                ch.len_utf8()
            }
            _ => {
                out.push(ch);
                ch.len_utf8()
            }
        };
        previous = match ch {
            '\\' => None,
            _ => rest[..consumed].chars().next_back(),
        };
        rest = &rest[consumed..];
    }

    if strike_open {
        out.push_str("</del>");
    }
    out
}

/// Byte length of a bracketed label starting `s` that must stay as written.
///
/// That is a footnote label, the label half of a full reference link, or a
/// collapsed or shortcut reference to a defined label.
fn raw_label_len(s: &str, after_close: bool, labels: &HashSet<String>) -> Option<usize> {
    let len = bracket_len(s)?;
    let inner = &s[1..len - 1];
    let next = &s[len..];
    let shortcut = labels.contains(&normalize_label(inner))
        && !next.starts_with('(')
        && (!next.starts_with('[') || next.starts_with("[]"));
    (inner.starts_with('^') || after_close || shortcut).then_some(len)
}

/// Byte length of the bracket starting `s`, through its closing `]`.
///
/// Labels cannot nest, so an unescaped `[` inside means no label.
fn bracket_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices().skip(1);
    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' => return None,
            ']' => return Some(pos + 1),
            _ => {}
        }
    }
    None
}

/// Byte length of the code span (or bare backtick run) starting `s`.
fn code_span_len(s: &str) -> usize {
    let ticks = s.bytes().take_while(|&b| b == b'`').count();
    let mut search = ticks;
    while let Some(pos) = s[search..].find('`') {
        let start = search + pos;
        let run = s[start..].bytes().take_while(|&b| b == b'`').count();
        if run == ticks {
            return start + run;
        }
        search = start + run;
    }
    ticks
}

/// Byte length of an inline math span starting `s`, if there is one.
///
/// Follows the usual dollar rules: the opening `$` is not followed by
/// whitespace and the closing `$` is not preceded by whitespace.
fn math_span_len(s: &str) -> Option<usize> {
    if let Some(body) = s.strip_prefix("$$") {
        let end = body.find("$$")?;
        return (end > 0).then_some(2 + end + 2);
    }

    let body = &s[1..];
    if body.starts_with(char::is_whitespace) {
        return None;
    }
    let end = body.find('$')?;
    if end == 0 || body[..end].ends_with(char::is_whitespace) {
        return None;
    }
    Some(1 + end + 1)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn token_count(text: &str) -> usize {
        text.matches(TOKEN_OPEN).count()
    }

    #[test]
    fn test_strikethrough_becomes_del() {
        let result = preprocess("a ~~struck~~ b");
        assert_eq!(result.text, "a <del>struck</del> b");
    }

    #[test]
    fn test_two_strikes_on_one_line() {
        let result = preprocess("~~a~~ and ~~b~~");
        assert_eq!(result.text, "<del>a</del> and <del>b</del>");
    }

    #[test]
    fn test_unpaired_tildes_untouched() {
        let result = preprocess("approx ~~ 5");
        assert_eq!(result.text, "approx ~~ 5");
    }

    #[test]
    fn test_strike_does_not_span_lines() {
        let result = preprocess("~~open\nclose~~\n");
        assert_eq!(result.text, "~~open\nclose~~\n");
    }

    #[test]
    fn test_code_span_is_verbatim() {
        let result = preprocess(r"`~~x~~ \*` and ~~y~~");
        assert_eq!(result.text, r"`~~x~~ \*` and <del>y</del>");
        assert!(result.placeholders.is_empty());
    }

    #[test]
    fn test_fenced_code_is_verbatim() {
        let input = "```\n~~x~~ \\*\n```\n";
        let result = preprocess(input);
        assert_eq!(result.text, input);
        assert!(result.placeholders.is_empty());
    }

    #[test]
    fn test_inline_math_is_verbatim() {
        let result = preprocess(r"$\{a\}$ and ~~b~~");
        assert_eq!(result.text, r"$\{a\}$ and <del>b</del>");
    }

    #[test]
    fn test_display_math_block_is_verbatim() {
        let input = "$$\n\\{x\\}\n$$\n";
        assert_eq!(preprocess(input).text, input);
    }

    #[test]
    fn test_dollar_amounts_are_not_math() {
        let result = preprocess(r"costs $5 and \*");
        assert_eq!(token_count(&result.text), 1);
    }

    #[test]
    fn test_escapes_become_tokens() {
        let result = preprocess(r"\*not bold\* and \{braces\}");
        assert_eq!(result.placeholders.len(), 4);
        assert!(!result.text.contains('\\'));
        let literals: Vec<char> = result.placeholders.iter().map(|(_, c)| c).collect();
        assert_eq!(literals, vec!['*', '*', '{', '}']);
    }

    #[test]
    fn test_backslash_before_letter_is_kept() {
        let result = preprocess(r"C:\path");
        assert_eq!(result.text, r"C:\path");
    }

    #[test]
    fn test_escaped_tilde_prevents_strike() {
        let result = preprocess(r"\~~x~~");
        assert!(!result.text.contains("<del>x"));
    }

    #[test]
    fn test_reserved_code_points_are_tokenized() {
        let input = format!("a{TOKEN_OPEN}1{TOKEN_CLOSE}b");
        let result = preprocess(&input);
        assert_eq!(result.placeholders.len(), 2);
    }

    #[test]
    fn test_definition_list() {
        let result = preprocess("Apple\n: A fruit\n: A company\n\nAfter\n");
        assert_eq!(
            result.text,
            "**Apple**\n\n- A fruit\n- A company\n\n\nAfter\n"
        );
    }

    #[test]
    fn test_definition_needs_block_start() {
        let input = "line one\nTerm\n: def\n";
        assert_eq!(preprocess(input).text, input);
    }

    #[test]
    fn test_reference_definition_is_verbatim() {
        let input = "Text\n\n[unused]: https://x.test/a\\_b \"T\\*\"\n";
        let result = preprocess(input);
        assert_eq!(result.text, input);
        assert!(result.placeholders.is_empty());
    }

    #[test]
    fn test_reference_definition_title_on_next_line() {
        let input = "[r]: https://x.test\n  \"A \\* title\"\n";
        assert!(preprocess(input).placeholders.is_empty());
    }

    #[test]
    fn test_definition_cannot_interrupt_paragraph() {
        let result = preprocess("para\n[x]: https://x.test/a\\_b\n");
        assert_eq!(token_count(&result.text), 1);
    }

    #[test]
    fn test_reference_labels_are_verbatim() {
        let input = concat!(
            "See [x][foo\\_bar], [foo\\_bar][] and [Foo\\_bar].\n\n",
            "[foo\\_bar]: https://x.test\n",
        );
        let result = preprocess(input);
        assert_eq!(result.text, input);
        assert!(result.placeholders.is_empty());
    }

    #[test]
    fn test_link_text_is_still_tokenized() {
        let result = preprocess(r"[\*x\*](https://x.test) and [\*y\*][r]");
        assert_eq!(result.placeholders.len(), 4);
        assert!(result.text.ends_with("[r]"));
    }

    #[test]
    fn test_footnote_labels_are_verbatim() {
        let result = preprocess("Claim[^a\\_b] \\*.\n\n[^a\\_b]: Note \\*.\n");
        assert_eq!(result.text.matches(r"[^a\_b]").count(), 2);
        assert_eq!(result.placeholders.len(), 2);
    }

    #[test]
    fn test_preserves_missing_trailing_newline() {
        assert_eq!(preprocess("x").text, "x");
        assert_eq!(preprocess("x\n").text, "x\n");
    }
}
