//! Per-document conversion pipeline.

use std::fmt;

use tracing::{debug, warn};

use crate::backend::RenderBackend;
use crate::builder::build;
use crate::confluence::ConfluenceBackend;
use crate::context::{RenderContext, RenderOptions};
use crate::document::Document;
use crate::error::{ConvertError, Warning};
use crate::jira::JiraBackend;
use crate::metadata::{PublishMetadata, extract};
use crate::placeholder::restore;
use crate::preprocess::preprocess;
use crate::renderer::MarkupRenderer;

/// Target markup dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Confluence storage format (XHTML).
    Confluence,
    /// Jira wiki markup.
    Jira,
}

impl Dialect {
    /// File extension for converted output, without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Confluence => "confluence.xml",
            Self::Jira => "jira.txt",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confluence => f.write_str("confluence"),
            Self::Jira => f.write_str("jira"),
        }
    }
}

/// A converted document.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub markup: String,
    pub metadata: PublishMetadata,
    /// Degraded constructs and front matter problems.
    pub warnings: Vec<Warning>,
}

/// Convert a document into `dialect`.
///
/// # Errors
///
/// Returns [`ConvertError`] if the document cannot be parsed or if placeholder
/// restoration fails. Unsupported constructs are reported as warnings.
pub fn convert(
    document: &Document,
    dialect: Dialect,
    options: &RenderOptions,
) -> Result<Conversion, ConvertError> {
    match dialect {
        Dialect::Confluence => convert_with::<ConfluenceBackend>(document, options),
        Dialect::Jira => convert_with::<JiraBackend>(document, options),
    }
}

/// Convert a document with an explicit backend.
///
/// # Errors
///
/// See [`convert`].
pub fn convert_with<B: RenderBackend>(
    document: &Document,
    options: &RenderOptions,
) -> Result<Conversion, ConvertError> {
    let metadata = extract(document);

    let mut pre = preprocess(&document.body);
    debug!(placeholders = pre.placeholders.len(), "Preprocessed document");

    let mut tree = build(&pre.text, &mut pre.placeholders)?;
    debug!(blocks = tree.blocks.len(), "Built node tree");

    // The heading is the title only when front matter did not supply one.
    // Its tokens leave the registry along with it.
    if options.strip_title
        && document.front_matter.title.is_none()
        && let Some(title) = tree.take_title_heading()
    {
        pre.placeholders.settle_literal(&title);
    }

    let ctx = RenderContext::new(*options, pre.placeholders);
    let result = MarkupRenderer::<B>::new(ctx).render(&tree);
    let markup = restore(&result.markup, &result.placeholders, B::literal)?;

    let mut warnings = document.warnings.clone();
    warnings.extend(result.warnings);
    for warning in &warnings {
        warn!(title = %metadata.title, "{warning}");
    }

    Ok(Conversion {
        markup,
        metadata,
        warnings,
    })
}

/// Convert every document independently.
///
/// A failure is reported in that document's slot and never stops the batch.
#[must_use]
pub fn convert_batch(
    documents: &[Document],
    dialect: Dialect,
    options: &RenderOptions,
) -> Vec<Result<Conversion, ConvertError>> {
    documents
        .iter()
        .map(|document| convert(document, dialect, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn convert_str(markdown: &str, dialect: Dialect) -> Conversion {
        convert(&Document::parse(markdown), dialect, &RenderOptions::default()).unwrap()
    }

    #[test]
    fn test_emphasis_in_both_dialects() {
        let markdown = "**bold** and *italic*";
        assert_eq!(
            convert_str(markdown, Dialect::Confluence).markup,
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
        assert_eq!(convert_str(markdown, Dialect::Jira).markup, "*bold* and _italic_");
    }

    #[test]
    fn test_table_rows_preserved() {
        let markdown = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        let confluence = convert_str(markdown, Dialect::Confluence).markup;
        assert_eq!(confluence.matches("<tr>").count(), 3);
        assert_eq!(confluence.matches("<th>").count(), 2);
        let jira = convert_str(markdown, Dialect::Jira).markup;
        let lines: Vec<&str> = jira.lines().collect();
        assert_eq!(lines, vec!["||A||B||", "|1|2|", "|3|4|"]);
    }

    #[test]
    fn test_strikethrough_tildes_never_leak() {
        for dialect in [Dialect::Confluence, Dialect::Jira] {
            let markup = convert_str("keep ~~struck~~ out", dialect).markup;
            assert!(markup.contains("struck"));
            assert!(!markup.contains("~~"));
        }
    }

    #[test]
    fn test_math_disabled_keeps_text() {
        for dialect in [Dialect::Confluence, Dialect::Jira] {
            let markup = convert_str("Area $x^2$ here", dialect).markup;
            assert!(markup.contains("x^2"));
            assert!(!markup.contains("ac:name=\"math\""));
            assert!(!markup.contains("{latex}"));
        }
    }

    #[test]
    fn test_footnote_in_both_dialects() {
        let markdown = "Claim[^1].\n\n[^1]: The source.\n";
        let confluence = convert_str(markdown, Dialect::Confluence).markup;
        assert!(confluence.contains(r#"ac:anchor="footnote-1""#));
        assert!(confluence.contains("The source."));
        let jira = convert_str(markdown, Dialect::Jira).markup;
        assert!(jira.contains("Claim\\[1\\]"));
        assert!(jira.ends_with("# The source."));
    }

    #[test]
    fn test_escaped_literals_survive() {
        let markdown = r"Use \*stars\* and \{braces\}";
        assert_eq!(
            convert_str(markdown, Dialect::Confluence).markup,
            "<p>Use *stars* and {braces}</p>"
        );
        assert_eq!(
            convert_str(markdown, Dialect::Jira).markup,
            r"Use \*stars\* and \{braces\}"
        );
    }

    #[test]
    fn test_unused_reference_definition() {
        let markdown = "Text\n\n[unused]: https://x.test/a\\_b\n";
        assert_eq!(convert_str(markdown, Dialect::Jira).markup, "Text");
        assert_eq!(
            convert_str(markdown, Dialect::Confluence).markup,
            "<p>Text</p>"
        );
    }

    #[test]
    fn test_reference_definition_used_twice() {
        let markdown = "[a][r] and [b][r]\n\n[r]: https://x.test/a\\_b\n";
        assert_eq!(
            convert_str(markdown, Dialect::Jira).markup,
            "[a|https://x.test/a_b] and [b|https://x.test/a_b]"
        );
        assert_eq!(
            convert_str(markdown, Dialect::Confluence).markup,
            r#"<p><a href="https://x.test/a_b">a</a> and <a href="https://x.test/a_b">b</a></p>"#
        );
    }

    #[test]
    fn test_escaped_reference_label_resolves() {
        let markdown = "See [x][foo\\_bar].\n\n[foo\\_bar]: https://x.test\n";
        assert_eq!(
            convert_str(markdown, Dialect::Jira).markup,
            "See [x|https://x.test]."
        );
    }

    #[test]
    fn test_escaped_footnote_label_resolves() {
        let markdown = "Claim[^a\\_b].\n\n[^a\\_b]: Note.\n";
        let jira = convert_str(markdown, Dialect::Jira).markup;
        assert!(jira.starts_with("Claim\\[1\\]."));
        assert!(jira.ends_with("# Note."));
        let confluence = convert_str(markdown, Dialect::Confluence).markup;
        assert!(confluence.contains(r#"ac:anchor="footnote-1""#));
        assert!(confluence.contains("Note."));
    }

    #[test]
    fn test_strip_title_removes_heading() {
        let options = RenderOptions {
            strip_title: true,
            ..RenderOptions::default()
        };
        let doc = Document::parse("# My \\*Page\\*\n\nBody.\n");
        let conversion = convert(&doc, Dialect::Jira, &options).unwrap();
        assert_eq!(conversion.markup, "Body.");
        assert_eq!(conversion.metadata.title, "My *Page*");
    }

    #[test]
    fn test_strip_title_keeps_heading_when_front_matter_has_title() {
        let options = RenderOptions {
            strip_title: true,
            ..RenderOptions::default()
        };
        let doc = Document::parse("---\ntitle: Explicit\n---\n# Heading\n");
        let conversion = convert(&doc, Dialect::Jira, &options).unwrap();
        assert_eq!(conversion.markup, "h1. Heading");
        assert_eq!(conversion.metadata.title, "Explicit");
    }

    #[test]
    fn test_malformed_front_matter_is_a_warning() {
        let conversion = convert_str("---\ntitle: [x\n---\nBody\n", Dialect::Jira);
        assert!(conversion.markup.contains("Body"));
        assert!(matches!(
            conversion.warnings.as_slice(),
            [Warning::MalformedFrontMatter { .. }]
        ));
    }

    #[test]
    fn test_batch_keeps_order_and_independence() {
        let documents = vec![
            Document::parse("# One\n"),
            Document::parse("<div>raw</div>\n"),
            Document::parse("# Three\n"),
        ];
        let results = convert_batch(&documents, Dialect::Jira, &RenderOptions::default());
        assert_eq!(results.len(), 3);
        let titles: Vec<String> = results
            .iter()
            .map(|result| result.as_ref().unwrap().metadata.title.clone())
            .collect();
        assert_eq!(titles, vec!["One", "Untitled", "Three"]);
        assert_eq!(results[1].as_ref().unwrap().warnings.len(), 1);
    }

    #[test]
    fn test_dialect_extension() {
        assert_eq!(Dialect::Confluence.extension(), "confluence.xml");
        assert_eq!(Dialect::Jira.to_string(), "jira");
    }
}
