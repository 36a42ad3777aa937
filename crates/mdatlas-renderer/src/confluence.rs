//! Confluence backend for markdown rendering.
//!
//! Produces Confluence XHTML storage format for the REST API.

use std::fmt::Write;

use crate::backend::{FootnoteEntry, MathPlacement, RenderBackend, RenderedCell, RenderedList};
use crate::context::RenderContext;
use crate::tree::{AlertKind, Alignment, EmphasisStyle};
use crate::util::{escape_xml, push_escaped_xml};

/// Confluence render backend.
///
/// Produces Confluence XHTML storage format with:
/// - `ac:structured-macro` for code blocks, math and panels
/// - `ac:image` with `ri:url` for images
/// - Anchor macros linking footnote references to their definitions
pub struct ConfluenceBackend;

impl RenderBackend for ConfluenceBackend {
    const BLOCK_SEPARATOR: &'static str = "";

    fn text(text: &str, _ctx: &RenderContext, out: &mut String) {
        for c in text.chars() {
            push_escaped_xml(c, out);
        }
    }

    fn literal(literal: char, out: &mut String) {
        push_escaped_xml(literal, out);
    }

    fn heading(level: u8, content: &str, out: &mut String) {
        write!(out, "<h{level}>{content}</h{level}>").unwrap();
    }

    fn paragraph(content: &str, out: &mut String) {
        write!(out, "<p>{content}</p>").unwrap();
    }

    fn code_block(language: Option<&str>, code: &str, out: &mut String) {
        match language {
            Some(language) => {
                out.push_str(r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#);
                write!(
                    out,
                    r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
                    escape_xml(language)
                )
                .unwrap();
            }
            None => {
                out.push_str(r#"<ac:structured-macro ac:name="noformat" ac:schema-version="1">"#);
            }
        }
        write!(
            out,
            "<ac:plain-text-body>{}</ac:plain-text-body>",
            cdata(code)
        )
        .unwrap();
        out.push_str("</ac:structured-macro>");
    }

    fn code_span(code: &str, out: &mut String) {
        write!(out, "<code>{}</code>", escape_xml(code)).unwrap();
    }

    fn emphasis(style: EmphasisStyle, content: &str, out: &mut String) {
        let (open, close) = match style {
            EmphasisStyle::Bold => ("<strong>", "</strong>"),
            EmphasisStyle::Italic => ("<em>", "</em>"),
            EmphasisStyle::BoldItalic => ("<strong><em>", "</em></strong>"),
            EmphasisStyle::Strikethrough => {
                (r#"<span style="text-decoration: line-through;">"#, "</span>")
            }
        };
        write!(out, "{open}{content}{close}").unwrap();
    }

    fn link(href: &str, title: Option<&str>, content: &str, out: &mut String) {
        write!(out, r#"<a href="{}""#, escape_xml(href)).unwrap();
        if let Some(title) = title {
            write!(out, r#" title="{}""#, escape_xml(title)).unwrap();
        }
        write!(out, ">{content}</a>").unwrap();
    }

    fn image(src: &str, alt: &str, title: Option<&str>, out: &mut String) {
        out.push_str("<ac:image");
        if !alt.is_empty() {
            write!(out, r#" ac:alt="{}""#, escape_xml(alt)).unwrap();
        }
        if let Some(title) = title {
            write!(out, r#" ac:title="{}""#, escape_xml(title)).unwrap();
        }
        write!(
            out,
            r#"><ri:url ri:value="{}" /></ac:image>"#,
            escape_xml(src)
        )
        .unwrap();
    }

    fn list(list: &RenderedList, _ctx: &RenderContext, out: &mut String) {
        let tag = if list.ordered { "ol" } else { "ul" };
        if list.ordered && list.start != 1 {
            write!(out, r#"<ol start="{}">"#, list.start).unwrap();
        } else {
            write!(out, "<{tag}>").unwrap();
        }
        for item in &list.items {
            out.push_str("<li>");
            if let Some(checked) = item.task {
                out.push_str(if checked { "[x] " } else { "[ ] " });
            }
            for block in &item.blocks {
                out.push_str(&block.markup);
            }
            out.push_str("</li>");
        }
        write!(out, "</{tag}>").unwrap();
    }

    fn table(rows: &[Vec<RenderedCell>], out: &mut String) {
        out.push_str("<table><tbody>");
        for row in rows {
            out.push_str("<tr>");
            for cell in row {
                let tag = if cell.header { "th" } else { "td" };
                match text_align(cell.alignment) {
                    Some(align) => {
                        write!(out, r#"<{tag} style="text-align: {align};">"#).unwrap();
                    }
                    None => write!(out, "<{tag}>").unwrap(),
                }
                write!(out, "{}</{tag}>", cell.markup).unwrap();
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");
    }

    fn blockquote(
        kind: Option<AlertKind>,
        _depth: usize,
        content: &str,
        _ctx: &mut RenderContext,
        out: &mut String,
    ) {
        let macro_name = match kind {
            None | Some(AlertKind::Note) => "info",
            Some(AlertKind::Tip) => "tip",
            Some(AlertKind::Important) => "note",
            Some(AlertKind::Warning | AlertKind::Caution) => "warning",
        };
        write!(
            out,
            r#"<ac:structured-macro ac:name="{macro_name}" ac:schema-version="1">"#
        )
        .unwrap();
        if let Some(kind) = kind {
            write!(
                out,
                r#"<ac:parameter ac:name="title">{}</ac:parameter>"#,
                kind.label()
            )
            .unwrap();
        }
        write!(
            out,
            "<ac:rich-text-body>{content}</ac:rich-text-body></ac:structured-macro>"
        )
        .unwrap();
    }

    fn math(latex: &str, placement: MathPlacement, ctx: &RenderContext, out: &mut String) {
        if !ctx.options().enable_math {
            match placement {
                MathPlacement::Inline => out.push_str(&escape_xml(latex)),
                MathPlacement::Block => write!(out, "<p>{}</p>", escape_xml(latex)).unwrap(),
            }
            return;
        }

        out.push_str(r#"<ac:structured-macro ac:name="math" ac:schema-version="1">"#);
        if placement == MathPlacement::Block {
            out.push_str(r#"<ac:parameter ac:name="display">block</ac:parameter>"#);
        }
        write!(
            out,
            "<ac:plain-text-body>{}</ac:plain-text-body></ac:structured-macro>",
            cdata(latex)
        )
        .unwrap();
    }

    fn footnote_reference(number: usize, out: &mut String) {
        write!(
            out,
            r#"<sup><ac:link ac:anchor="footnote-{number}"><ac:plain-text-link-body><![CDATA[[{number}]]]></ac:plain-text-link-body></ac:link></sup>"#
        )
        .unwrap();
    }

    fn footnotes(entries: &[FootnoteEntry], _ctx: &mut RenderContext, out: &mut String) {
        out.push_str("<hr /><h3>Footnotes</h3><ol>");
        for entry in entries {
            write!(
                out,
                r#"<li><ac:structured-macro ac:name="anchor" ac:schema-version="1"><ac:parameter ac:name="">footnote-{}</ac:parameter></ac:structured-macro>"#,
                entry.number
            )
            .unwrap();
            for block in &entry.blocks {
                out.push_str(&block.markup);
            }
            out.push_str("</li>");
        }
        out.push_str("</ol>");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr />");
    }

    fn hard_break(_ctx: &RenderContext, out: &mut String) {
        out.push_str("<br />");
    }

    fn soft_break(ctx: &RenderContext, out: &mut String) {
        if ctx.options().preserve_line_breaks {
            out.push_str("<br />");
        } else {
            out.push('\n');
        }
    }
}

/// Wrap text in CDATA, splitting any `]]>` across two sections.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn text_align(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quick_xml::Reader;
    use quick_xml::events::Event;

    use super::*;
    use crate::backend::{ItemBlock, ItemBlockKind, RenderedItem};
    use crate::builder::build;
    use crate::context::RenderOptions;
    use crate::placeholder::{Placeholders, restore};
    use crate::preprocess::preprocess;
    use crate::renderer::MarkupRenderer;

    fn render_with(markdown: &str, options: RenderOptions) -> String {
        let mut pre = preprocess(markdown);
        let tree = build(&pre.text, &mut pre.placeholders).unwrap();
        let ctx = RenderContext::new(options, pre.placeholders);
        let result = MarkupRenderer::<ConfluenceBackend>::new(ctx).render(&tree);
        restore(&result.markup, &result.placeholders, ConfluenceBackend::literal).unwrap()
    }

    fn render(markdown: &str) -> String {
        render_with(markdown, RenderOptions::default())
    }

    /// Parse the output as XML wrapped in a synthetic root and count start
    /// tags with the given name.
    fn count_elements(xml: &str, name: &str) -> usize {
        let wrapped = format!(r#"<root xmlns:ac="urn:ac" xmlns:ri="urn:ri">{xml}</root>"#);
        let mut reader = Reader::from_str(&wrapped);
        let mut count = 0;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.name().as_ref() == name.as_bytes() => count += 1,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("malformed output: {err}\n{xml}"),
            }
        }
        count
    }

    fn ctx() -> RenderContext {
        RenderContext::new(RenderOptions::default(), Placeholders::new())
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            render("**bold** and *italic*"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn test_bold_italic_nests_tags() {
        assert_eq!(
            render("***both***"),
            "<p><strong><em>both</em></strong></p>"
        );
    }

    #[test]
    fn test_strikethrough() {
        let out = render("~~struck~~ text");
        assert_eq!(
            out,
            r#"<p><span style="text-decoration: line-through;">struck</span> text</p>"#
        );
        assert!(!out.contains('~'));
    }

    #[test]
    fn test_code_block_with_language() {
        let mut out = String::new();
        ConfluenceBackend::code_block(Some("python"), "print('hello')", &mut out);
        assert!(out.contains(r#"ac:name="code""#));
        assert!(out.contains(r#"ac:name="language">python"#));
        assert!(out.contains("<![CDATA[print('hello')]]>"));
    }

    #[test]
    fn test_code_block_without_language_uses_noformat() {
        let mut out = String::new();
        ConfluenceBackend::code_block(None, "plain code", &mut out);
        assert!(out.contains(r#"ac:name="noformat""#));
        assert!(!out.contains(r#"ac:name="language""#));
        assert!(out.contains("plain code"));
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let mut out = String::new();
        ConfluenceBackend::code_block(Some("xml"), "a]]>b", &mut out);
        assert!(out.contains("<![CDATA[a]]]]><![CDATA[>b]]>"));
        assert_eq!(count_elements(&out, "ac:structured-macro"), 1);
    }

    #[test]
    fn test_nested_list_keeps_three_levels() {
        let out = render("- one\n  - two\n    - three\n- four\n");
        assert_eq!(
            out,
            "<ul><li>one<ul><li>two<ul><li>three</li></ul></li></ul></li><li>four</li></ul>"
        );
        assert_eq!(count_elements(&out, "li"), 4);
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(
            render("3. c\n4. d\n"),
            r#"<ol start="3"><li>c</li><li>d</li></ol>"#
        );
    }

    #[test]
    fn test_task_list_markers() {
        let list = RenderedList {
            ordered: false,
            start: 1,
            items: vec![
                RenderedItem {
                    task: Some(true),
                    blocks: vec![ItemBlock {
                        kind: ItemBlockKind::Text,
                        markup: "done".to_owned(),
                    }],
                },
                RenderedItem {
                    task: Some(false),
                    blocks: vec![],
                },
            ],
        };
        let mut out = String::new();
        ConfluenceBackend::list(&list, &ctx(), &mut out);
        assert_eq!(out, "<ul><li>[x] done</li><li>[ ] </li></ul>");
    }

    #[test]
    fn test_table_shape_and_alignment() {
        let out = render("| A | B |\n|:-:|---|\n| 1 | 2 |\n| 3 | 4 |\n");
        assert_eq!(count_elements(&out, "tr"), 3);
        assert_eq!(count_elements(&out, "th"), 2);
        assert_eq!(count_elements(&out, "td"), 4);
        assert!(out.starts_with(
            r#"<table><tbody><tr><th style="text-align: center;">A</th><th>B</th></tr>"#
        ));
    }

    #[test]
    fn test_empty_table() {
        let mut out = String::new();
        ConfluenceBackend::table(&[], &mut out);
        assert_eq!(out, "<table><tbody></tbody></table>");
    }

    #[test]
    fn test_blockquote_is_info_macro() {
        let out = render("> quoted\n");
        assert_eq!(
            out,
            r#"<ac:structured-macro ac:name="info" ac:schema-version="1"><ac:rich-text-body><p>quoted</p></ac:rich-text-body></ac:structured-macro>"#
        );
    }

    #[test]
    fn test_alert_macros() {
        let out = render("> [!WARNING]\n> careful\n\n> [!TIP]\n> hint\n");
        assert!(out.contains(r#"ac:name="warning""#));
        assert!(out.contains(r#"<ac:parameter ac:name="title">Warning</ac:parameter>"#));
        assert!(out.contains(r#"ac:name="tip""#));
    }

    #[test]
    fn test_nested_blockquote_nests_macros() {
        let out = render("> outer\n>\n> > inner\n");
        assert_eq!(count_elements(&out, "ac:rich-text-body"), 2);
    }

    #[test]
    fn test_link_and_image() {
        let out = render(r#"[site](https://a.test/?x=1&y=2 "Home") ![logo](https://a.test/l.png)"#);
        assert!(out.contains(r#"<a href="https://a.test/?x=1&amp;y=2" title="Home">site</a>"#));
        assert!(out.contains(
            r#"<ac:image ac:alt="logo"><ri:url ri:value="https://a.test/l.png" /></ac:image>"#
        ));
    }

    #[test]
    fn test_footnotes_section() {
        let out = render("Claim[^1].\n\n[^1]: Source.\n");
        assert!(out.starts_with(r#"<p>Claim<sup><ac:link ac:anchor="footnote-1">"#));
        assert!(out.contains("<hr /><h3>Footnotes</h3><ol><li>"));
        assert!(out.contains(r#"<ac:parameter ac:name="">footnote-1</ac:parameter>"#));
        assert!(out.ends_with("<p>Source.</p></li></ol>"));
        count_elements(&out, "li");
    }

    #[test]
    fn test_math_enabled() {
        let options = RenderOptions {
            enable_math: true,
            ..RenderOptions::default()
        };
        let out = render_with("Area $x^2$.\n\n$$\n\\frac{a}{b}\n$$\n", options);
        assert!(out.contains(
            r#"<ac:structured-macro ac:name="math" ac:schema-version="1"><ac:plain-text-body><![CDATA[x^2]]>"#
        ));
        assert!(out.contains(r#"<ac:parameter ac:name="display">block</ac:parameter>"#));
        assert!(out.contains(r"<![CDATA[\frac{a}{b}]]>"));
    }

    #[test]
    fn test_math_disabled_keeps_text() {
        let out = render("Area $x<2$.\n");
        assert_eq!(out, "<p>Area x&lt;2.</p>");
        assert!(!out.contains("ac:name=\"math\""));
    }

    #[test]
    fn test_soft_break_modes() {
        assert_eq!(render("a\nb"), "<p>a<br />b</p>");
        let options = RenderOptions {
            preserve_line_breaks: false,
            ..RenderOptions::default()
        };
        assert_eq!(render_with("a\nb", options), "<p>a\nb</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render(r#"a < b & "c""#), "<p>a &lt; b &amp; &quot;c&quot;</p>");
    }

    #[test]
    fn test_escaped_markup_restored_as_text() {
        assert_eq!(render(r"\*not bold\* \<tag\>"), "<p>*not bold* &lt;tag&gt;</p>");
    }

    #[test]
    fn test_code_span() {
        assert_eq!(render("use `a<b`"), "<p>use <code>a&lt;b</code></p>");
    }

    #[test]
    fn test_rule_and_hard_break() {
        assert_eq!(render("a  \nb\n\n---\n"), "<p>a<br />b</p><hr />");
    }

    #[test]
    fn test_document_is_well_formed() {
        let markdown = "# Title\n\nIntro with `code` and [link](https://x.test).\n\n\
                        - [x] done\n- [ ] todo\n  1. nested\n\n\
                        | H |\n|---|\n| c |\n\n> [!NOTE]\n> note\n\n\
                        ```rust\nfn main() {}\n```\n\nText[^n].\n\n[^n]: Footnote.\n";
        let out = render(markdown);
        count_elements(&out, "p");
    }
}
