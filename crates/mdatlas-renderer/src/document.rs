//! Source documents and their YAML front matter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::Warning;

/// Publishing hints from the `---` block at the top of a document.
///
/// Unknown keys are kept in [`extra`](Self::extra).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "optional_string")]
    pub title: Option<String>,
    /// Confluence space key.
    #[serde(deserialize_with = "optional_string")]
    pub space: Option<String>,
    /// Jira project key.
    #[serde(deserialize_with = "optional_string")]
    pub project: Option<String>,
    /// Parent page title or parent issue key.
    #[serde(deserialize_with = "optional_string")]
    pub parent: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub components: Vec<String>,
    /// Time estimate such as `2d` or `4h`.
    #[serde(deserialize_with = "optional_string")]
    pub estimate: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Markdown document ready for conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// Markdown body without front matter.
    pub body: String,
    pub front_matter: FrontMatter,
    /// Source path, used for the fallback title.
    pub path: Option<PathBuf>,
    /// Problems found while splitting off front matter.
    pub warnings: Vec<Warning>,
}

impl Document {
    /// Split `source` into front matter and body.
    ///
    /// Front matter that is not valid YAML stays in the body and produces a
    /// warning, so no text is lost.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let Some((yaml, body)) = split_front_matter(source) else {
            return Self {
                body: source.to_owned(),
                ..Self::default()
            };
        };

        match parse_front_matter(yaml) {
            Ok(front_matter) => Self {
                body: body.to_owned(),
                front_matter,
                ..Self::default()
            },
            Err(reason) => Self {
                body: source.to_owned(),
                warnings: vec![Warning::MalformedFrontMatter { reason }],
                ..Self::default()
            },
        }
    }

    /// Attach the path the document was read from.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// File stem of the source path.
    pub fn file_stem(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|stem| stem.to_str())
    }
}

/// Find a leading `---` block, returning its YAML and the remaining body.
fn split_front_matter(source: &str) -> Option<(&str, &str)> {
    let rest = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

fn parse_front_matter(yaml: &str) -> Result<FrontMatter, String> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| e.to_string())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_string))
}

/// Accept a YAML list, a single scalar, or a comma-separated string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(other) => scalar_string(&other).into_iter().collect(),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_front_matter() {
        let doc = Document::parse("# Title\n\nBody\n");
        assert_eq!(doc.body, "# Title\n\nBody\n");
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_front_matter_fields() {
        let source = concat!(
            "---\ntitle: Release Notes\nspace: DOCS\nlabels: [a, b]\n",
            "components:\n  - 10010\n  - 10013\nestimate: 3d\nowner: sam\n---\nBody\n",
        );
        let doc = Document::parse(source);
        assert_eq!(doc.body, "Body\n");
        let fm = &doc.front_matter;
        assert_eq!(fm.title.as_deref(), Some("Release Notes"));
        assert_eq!(fm.space.as_deref(), Some("DOCS"));
        assert_eq!(fm.labels, vec!["a", "b"]);
        assert_eq!(fm.components, vec!["10010", "10013"]);
        assert_eq!(fm.estimate.as_deref(), Some("3d"));
        assert_eq!(fm.extra.get("owner"), Some(&Value::String("sam".to_owned())));
    }

    #[test]
    fn test_comma_separated_labels() {
        let doc = Document::parse("---\nlabels: docs, api ,\n---\n");
        assert_eq!(doc.front_matter.labels, vec!["docs", "api"]);
    }

    #[test]
    fn test_empty_front_matter() {
        let doc = Document::parse("---\n---\ntext");
        assert_eq!(doc.body, "text");
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_malformed_front_matter_kept_as_body() {
        let source = "---\ntitle: [unclosed\n---\nBody\n";
        let doc = Document::parse(source);
        assert_eq!(doc.body, source);
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let source = "---\ntitle: x\nno closing\n";
        let doc = Document::parse(source);
        assert_eq!(doc.body, source);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_crlf_front_matter() {
        let doc = Document::parse("---\r\ntitle: Win\r\n---\r\nBody");
        assert_eq!(doc.front_matter.title.as_deref(), Some("Win"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_file_stem() {
        let doc = Document::parse("x").with_path("docs/getting_started.md");
        assert_eq!(doc.file_stem(), Some("getting_started"));
        assert_eq!(Document::parse("x").file_stem(), None);
    }
}
