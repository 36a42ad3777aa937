//! Jira backend for markdown rendering.
//!
//! Produces Jira wiki markup. The dialect has no reliable nested lists, so
//! lists are flattened: every item uses the outermost list's marker and
//! deeper items carry a `» ` indent per extra level. Text that follows a
//! nested list or block inside the same item continues on an unmarked line,
//! so the number of marked lines equals the number of source items.
//!
//! Plain text is escaped wherever Jira would read it as markup: braces and
//! brackets always, `|` inside tables and links, and effect characters
//! (`*_-+^~` and `??`) where they could open or close a span.

use std::fmt::Write;

use crate::backend::{
    FootnoteEntry, ItemBlockKind, MathPlacement, RenderBackend, RenderedCell, RenderedList,
};
use crate::context::RenderContext;
use crate::error::Warning;
use crate::tree::{AlertKind, EmphasisStyle};
use crate::util::collapse_blank_lines;

/// Indent marker prefixed to list items per level beyond the first.
const INDENT_MARKER: &str = "» ";

/// Characters Jira reads as markup when they appear in plain text.
const SIGNIFICANT: &[char] = &[
    '*', '_', '-', '+', '^', '~', '?', '{', '}', '[', ']', '|', '!', '#',
];

/// Jira render backend.
pub struct JiraBackend;

impl RenderBackend for JiraBackend {
    const BLOCK_SEPARATOR: &'static str = "\n\n";

    fn text(text: &str, ctx: &RenderContext, out: &mut String) {
        let chars: Vec<char> = text.chars().collect();
        let at = |index: Option<usize>| index.and_then(|i| chars.get(i).copied());
        let mut index = 0;

        while index < chars.len() {
            let c = chars[index];
            let before = at(index.checked_sub(1));
            let after = at(Some(index + 1));
            match c {
                '{' | '}' | '[' | ']' => {
                    out.push('\\');
                    out.push(c);
                }
                '|' if ctx.in_table() || ctx.in_link() => out.push_str("\\|"),
                '*' | '_' | '-' | '+' | '^' | '~' if is_effect_edge(before, after) => {
                    out.push('\\');
                    out.push(c);
                }
                '?' if after == Some('?') && is_effect_edge(before, at(Some(index + 2))) => {
                    out.push_str("\\?\\?");
                    index += 1;
                }
                _ => out.push(c),
            }
            index += 1;
        }
    }

    fn literal(literal: char, out: &mut String) {
        if SIGNIFICANT.contains(&literal) {
            out.push('\\');
        }
        out.push(literal);
    }

    fn heading(level: u8, content: &str, out: &mut String) {
        write!(out, "h{level}. {content}").unwrap();
    }

    fn paragraph(content: &str, out: &mut String) {
        out.push_str(content);
    }

    fn code_block(language: Option<&str>, code: &str, out: &mut String) {
        match language.and_then(jira_language) {
            Some(language) => write!(out, "{{code:{language}}}").unwrap(),
            None => out.push_str("{code}"),
        }
        write!(out, "\n{code}\n{{code}}").unwrap();
    }

    fn code_span(code: &str, out: &mut String) {
        monospace(code, out);
    }

    fn emphasis(style: EmphasisStyle, content: &str, out: &mut String) {
        let (open, close) = match style {
            EmphasisStyle::Bold => ("*", "*"),
            EmphasisStyle::Italic => ("_", "_"),
            EmphasisStyle::BoldItalic => ("*_", "_*"),
            EmphasisStyle::Strikethrough => ("-", "-"),
        };
        write!(out, "{open}{content}{close}").unwrap();
    }

    fn link(href: &str, _title: Option<&str>, content: &str, out: &mut String) {
        if content.is_empty() || content == href {
            write!(out, "[{href}]").unwrap();
        } else {
            write!(out, "[{content}|{href}]").unwrap();
        }
    }

    fn image(src: &str, alt: &str, title: Option<&str>, out: &mut String) {
        let mut attributes = Vec::new();
        if !alt.is_empty() {
            attributes.push(format!("alt={alt}"));
        }
        if let Some(title) = title {
            attributes.push(format!("title={title}"));
        }
        if attributes.is_empty() {
            write!(out, "!{src}!").unwrap();
        } else {
            write!(out, "!{src}|{}!", attributes.join(", ")).unwrap();
        }
    }

    fn list(list: &RenderedList, ctx: &RenderContext, out: &mut String) {
        let depth = ctx.list_depth();
        let marker = if ctx.root_list_ordered() { '#' } else { '*' };
        let indent = INDENT_MARKER.repeat(depth.saturating_sub(1));

        for (index, item) in list.items.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            write!(out, "{marker} {indent}").unwrap();
            // Nested ordered lists keep their numbering as text.
            if depth > 1 && list.ordered {
                write!(out, "{}. ", list.start + index as u64).unwrap();
            }
            if let Some(checked) = item.task {
                out.push_str(if checked { "(/) " } else { "( ) " });
            }

            let mut line_open = true;
            let mut line_empty = true;
            for block in &item.blocks {
                match block.kind {
                    ItemBlockKind::Text => {
                        if !line_open {
                            // Continuation of this item, not a new one.
                            write!(out, "\n{indent}").unwrap();
                            line_empty = true;
                        }
                        if !line_empty {
                            out.push(' ');
                        }
                        out.push_str(&block.markup);
                        line_open = true;
                        line_empty = false;
                    }
                    ItemBlockKind::List | ItemBlockKind::Other => {
                        out.push('\n');
                        out.push_str(&block.markup);
                        line_open = false;
                    }
                }
            }
        }
    }

    fn table(rows: &[Vec<RenderedCell>], out: &mut String) {
        for (index, row) in rows.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let separator = if row.iter().any(|cell| cell.header) {
                "||"
            } else {
                "|"
            };
            out.push_str(separator);
            for cell in row {
                if cell.markup.is_empty() {
                    out.push(' ');
                } else {
                    out.push_str(&cell.markup);
                }
                out.push_str(separator);
            }
        }
    }

    fn blockquote(
        kind: Option<AlertKind>,
        depth: usize,
        content: &str,
        ctx: &mut RenderContext,
        out: &mut String,
    ) {
        if depth > 1 {
            ctx.warn(Warning::unsupported(
                "nested blockquote",
                "content of the enclosing quote",
            ));
            out.push_str(content);
            return;
        }
        match kind {
            Some(kind) => {
                write!(out, "{{panel:title={}}}\n{content}\n{{panel}}", kind.label()).unwrap();
            }
            None => write!(out, "{{quote}}\n{content}\n{{quote}}").unwrap(),
        }
    }

    fn math(latex: &str, placement: MathPlacement, ctx: &RenderContext, out: &mut String) {
        let (open, close) = match (ctx.options().enable_math, placement) {
            (true, MathPlacement::Inline) => ("{latex}", "{latex}"),
            (true, MathPlacement::Block) => ("{latex}\n", "\n{latex}"),
            (false, MathPlacement::Inline) => return monospace(latex, out),
            (false, MathPlacement::Block) => ("{noformat}\n", "\n{noformat}"),
        };
        write!(out, "{open}{latex}{close}").unwrap();
    }

    fn footnote_reference(number: usize, out: &mut String) {
        write!(out, "\\[{number}\\]").unwrap();
    }

    fn footnotes(entries: &[FootnoteEntry], ctx: &mut RenderContext, out: &mut String) {
        out.push_str("----\nh3. Footnotes");
        for entry in entries {
            out.push_str("\n#");
            for block in &entry.blocks {
                match block.kind {
                    ItemBlockKind::Text => {
                        out.push(' ');
                        out.push_str(&block.markup);
                    }
                    ItemBlockKind::List | ItemBlockKind::Other => {
                        ctx.warn(Warning::unsupported(
                            "block content in footnote",
                            "lines joined by line breaks",
                        ));
                        for line in block_lines(&block.markup) {
                            write!(out, " \\\\ {line}").unwrap();
                        }
                    }
                }
            }
        }
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("----");
    }

    fn hard_break(ctx: &RenderContext, out: &mut String) {
        if ctx.single_line() {
            out.push_str("\\\\ ");
        } else {
            out.push_str("\\\\\n");
        }
    }

    fn soft_break(ctx: &RenderContext, out: &mut String) {
        out.push(if ctx.single_line() { ' ' } else { '\n' });
    }

    fn finish(markup: String) -> String {
        collapse_blank_lines(markup.trim())
    }
}

/// Whether a formatting character could open or close a Jira effect between
/// `before` and `after`.
fn is_effect_edge(before: Option<char>, after: Option<char>) -> bool {
    let opens = !before.is_some_and(char::is_alphanumeric)
        && after.is_some_and(|c| !c.is_whitespace());
    let closes = before.is_some_and(|c| !c.is_whitespace())
        && !after.is_some_and(char::is_alphanumeric);
    opens || closes
}

/// `{{code}}` with braces escaped so the run cannot end early.
fn monospace(code: &str, out: &mut String) {
    out.push_str("{{");
    for c in code.chars() {
        if matches!(c, '{' | '}') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("}}");
}

/// Content lines of a rendered block, without macro delimiter lines.
fn block_lines(markup: &str) -> impl Iterator<Item = &str> {
    markup.lines().map(str::trim).filter(|line| {
        let delimiter = ["{code", "{noformat", "{quote", "{panel"]
            .iter()
            .any(|open| line.starts_with(open))
            && line.ends_with('}');
        !line.is_empty() && !delimiter
    })
}

/// Map a fence language to a language Jira's code macro recognizes.
fn jira_language(language: &str) -> Option<&'static str> {
    let language = language.to_ascii_lowercase();
    let normalized = match language.as_str() {
        "actionscript" | "as" => "actionscript",
        "ada" => "ada",
        "applescript" => "applescript",
        "bash" | "sh" | "shell" | "zsh" | "console" => "bash",
        "c" | "h" => "c",
        "c#" | "csharp" | "cs" => "c#",
        "c++" | "cpp" | "cxx" | "cc" | "hpp" => "cpp",
        "css" => "css",
        "erlang" | "erl" => "erlang",
        "go" | "golang" => "go",
        "groovy" => "groovy",
        "haskell" | "hs" => "haskell",
        "html" | "htm" | "xhtml" => "html",
        "java" => "java",
        "javascript" | "js" | "jsx" | "mjs" => "javascript",
        "json" => "json",
        "lua" => "lua",
        "objc" | "objective-c" | "objectivec" => "objc",
        "perl" | "pl" => "perl",
        "php" => "php",
        "python" | "py" | "python3" => "python",
        "r" => "r",
        "ruby" | "rb" => "ruby",
        "scala" => "scala",
        "sql" => "sql",
        "swift" => "swift",
        "vb" | "visualbasic" | "vbnet" => "visualbasic",
        "xml" | "xsd" | "svg" => "xml",
        "yaml" | "yml" => "yaml",
        _ => return None,
    };
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::build;
    use crate::context::RenderOptions;
    use crate::placeholder::restore;
    use crate::preprocess::preprocess;
    use crate::renderer::{MarkupRenderer, RenderResult};

    fn render_result(markdown: &str, options: RenderOptions) -> RenderResult {
        let mut pre = preprocess(markdown);
        let tree = build(&pre.text, &mut pre.placeholders).unwrap();
        let ctx = RenderContext::new(options, pre.placeholders);
        let mut result = MarkupRenderer::<JiraBackend>::new(ctx).render(&tree);
        result.markup =
            restore(&result.markup, &result.placeholders, JiraBackend::literal).unwrap();
        result
    }

    fn render(markdown: &str) -> String {
        render_result(markdown, RenderOptions::default()).markup
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(render("**bold** and *italic*"), "*bold* and _italic_");
    }

    #[test]
    fn test_bold_italic_nests_tokens() {
        assert_eq!(render("***both***"), "*_both_*");
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(render("~~struck~~ text"), "-struck- text");
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            render("# Title\n\nBody text.\n\n## Sub\n"),
            "h1. Title\n\nBody text.\n\nh2. Sub"
        );
    }

    #[test]
    fn test_nested_list_is_flattened() {
        let out = render("- one\n  - two\n    - three\n- four\n");
        assert_eq!(out, "* one\n* » two\n* » » three\n* four");
        assert!(!out.contains("**"));
        assert_eq!(out.lines().filter(|line| line.starts_with("* ")).count(), 4);
    }

    #[test]
    fn test_ordered_root_marker_applies_to_nested_items() {
        assert_eq!(render("1. a\n   - b\n2. c\n"), "# a\n# » b\n# c");
    }

    #[test]
    fn test_nested_ordered_keeps_numbers() {
        assert_eq!(render("- a\n  1. b\n  2. c\n"), "* a\n* » 1. b\n* » 2. c");
    }

    #[test]
    fn test_loose_item_paragraphs_join() {
        assert_eq!(render("- first\n\n  second\n- next\n"), "* first second\n* next");
    }

    #[test]
    fn test_task_items() {
        assert_eq!(render("- [x] done\n- [ ] todo\n"), "* (/) done\n* ( ) todo");
    }

    #[test]
    fn test_code_block_in_item_follows_on_new_line() {
        let out = render("- step\n\n  ```sh\n  ls\n  ```\n");
        assert_eq!(out, "* step\n{code:bash}\nls\n{code}");
    }

    fn marked_lines(out: &str) -> usize {
        out.lines().filter(|line| line.starts_with("* ")).count()
    }

    #[test]
    fn test_text_after_nested_list_continues_item() {
        let out = render("- a\n  - b\n\n  c\n- d\n");
        assert_eq!(out, "* a\n* » b\nc\n* d");
        assert_eq!(marked_lines(&out), 3);
    }

    #[test]
    fn test_text_after_code_block_continues_item() {
        let out = render("- step\n\n  ```\n  ls\n  ```\n\n  after\n");
        assert_eq!(out, "* step\n{code}\nls\n{code}\nafter");
        assert_eq!(marked_lines(&out), 1);
    }

    #[test]
    fn test_table_shape() {
        let out = render("| A | B |\n|---|:-:|\n| 1 |   |\n| 3 | 4 |\n");
        assert_eq!(out, "||A||B||\n|1| |\n|3|4|");
    }

    #[test]
    fn test_table_cell_pipe_escaped() {
        let out = render("| A |\n|---|\n| a \\| b |\n");
        assert_eq!(out, "||A||\n|a \\| b|");
    }

    #[test]
    fn test_links() {
        assert_eq!(render("[site](https://a.test)"), "[site|https://a.test]");
        assert_eq!(render("<https://a.test>"), "[https://a.test]");
    }

    #[test]
    fn test_image_attributes() {
        assert_eq!(render("![](pic.png)"), "!pic.png!");
        assert_eq!(
            render("![Logo](pic.png \"Brand\")"),
            "!pic.png|alt=Logo, title=Brand!"
        );
    }

    #[test]
    fn test_code_block_languages() {
        assert_eq!(render("```py\nx = 1\n```\n"), "{code:python}\nx = 1\n{code}");
        assert_eq!(render("```brainfuck\n+.\n```\n"), "{code}\n+.\n{code}");
        assert_eq!(render("    indented\n"), "{code}\nindented\n{code}");
    }

    #[test]
    fn test_code_span() {
        assert_eq!(render("run `make`"), "run {{make}}");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(render("> quoted\n"), "{quote}\nquoted\n{quote}");
    }

    #[test]
    fn test_nested_blockquote_unwrapped_with_warning() {
        let result = render_result("> a\n>\n> > b\n", RenderOptions::default());
        assert_eq!(result.markup, "{quote}\na\n\nb\n{quote}");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_alert_becomes_panel() {
        assert_eq!(
            render("> [!WARNING]\n> careful\n"),
            "{panel:title=Warning}\ncareful\n{panel}"
        );
    }

    #[test]
    fn test_math_disabled_degrades_to_monospace() {
        let out = render("Area $x^2$.\n\n$$\ny = 2\n$$\n");
        assert_eq!(out, "Area {{x^2}}.\n\n{noformat}\ny = 2\n{noformat}");
    }

    #[test]
    fn test_math_enabled_uses_latex_macro() {
        let options = RenderOptions {
            enable_math: true,
            ..RenderOptions::default()
        };
        let out = render_result("Area $x^2$.\n", options).markup;
        assert_eq!(out, "Area {latex}x^2{latex}.");
    }

    #[test]
    fn test_text_escapes_braces_and_brackets() {
        assert_eq!(render("a {b} [c]"), "a \\{b\\} \\[c\\]");
    }

    #[test]
    fn test_text_escapes_effect_pairs() {
        assert_eq!(
            render("Use the (-deprecated-) flag and x^2^ or +new+."),
            "Use the (\\-deprecated\\-) flag and x^2\\^ or \\+new\\+."
        );
        assert_eq!(render("a ??cite?? b"), "a \\?\\?cite\\?\\? b");
    }

    #[test]
    fn test_text_keeps_inner_word_punctuation() {
        assert_eq!(render("well-known on 2024-01-02, a - b"), "well-known on 2024-01-02, a - b");
        assert_eq!(render("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn test_link_text_pipe_escaped() {
        assert_eq!(render("[a | b](https://x.test)"), "[a \\| b|https://x.test]");
    }

    #[test]
    fn test_code_span_braces_escaped() {
        assert_eq!(render("run `a}}b`"), "run {{a\\}\\}b}}");
    }

    #[test]
    fn test_escaped_markup_restored_escaped() {
        assert_eq!(render(r"\*not bold\* and \_x\_"), r"\*not bold\* and \_x\_");
    }

    #[test]
    fn test_footnotes() {
        let out = render("Claim[^1].\n\n[^1]: Source.\n");
        assert_eq!(out, "Claim\\[1\\].\n\n----\nh3. Footnotes\n# Source.");
    }

    #[test]
    fn test_footnote_block_content_stays_on_one_line() {
        let result = render_result(
            "x[^1]\n\n[^1]: note\n    - a\n    - b\n",
            RenderOptions::default(),
        );
        assert_eq!(
            result.markup,
            "x\\[1\\]\n\n----\nh3. Footnotes\n# note \\\\ * a \\\\ * b"
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_footnote_code_block_drops_delimiters() {
        let result = render_result(
            "x[^1]\n\n[^1]: see\n\n    ```sh\n    ls -l\n    ```\n",
            RenderOptions::default(),
        );
        assert!(result.markup.ends_with("# see \\\\ ls -l"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_breaks_and_rule() {
        assert_eq!(render("a  \nb\nc\n\n---\n"), "a\\\\\nb\nc\n\n----");
    }

    #[test]
    fn test_soft_break_in_list_is_space() {
        assert_eq!(render("- a\n  b\n"), "* a b");
    }

    #[test]
    fn test_html_block_degrades() {
        let result = render_result("<div>x</div>\n", RenderOptions::default());
        assert_eq!(result.markup, "<div>x</div>");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_jira_language_aliases() {
        assert_eq!(jira_language("YML"), Some("yaml"));
        assert_eq!(jira_language("csharp"), Some("c#"));
        assert_eq!(jira_language("rust"), None);
    }
}
