//! Publishing metadata derived from a document.

use std::sync::LazyLock;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;

use crate::builder::parser_options;
use crate::document::Document;
use crate::util::title_from_stem;

/// Title used when nothing else yields one.
pub const DEFAULT_TITLE: &str = "Untitled";

static DAY_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)\s*days?").expect("invalid day range regex"));
static DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*days?").expect("invalid days regex"));

/// Fields a publisher needs besides the rendered markup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PublishMetadata {
    pub title: String,
    /// Confluence space key or Jira project key.
    pub space_or_project: Option<String>,
    pub parent: Option<String>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    /// Estimate such as `5d`.
    pub time_estimate: Option<String>,
}

/// Derive publishing metadata from front matter and body.
#[must_use]
pub fn extract(document: &Document) -> PublishMetadata {
    let fm = &document.front_matter;
    PublishMetadata {
        title: resolve_title(document),
        space_or_project: fm.space.clone().or_else(|| fm.project.clone()),
        parent: fm.parent.clone(),
        labels: fm.labels.clone(),
        components: fm.components.clone(),
        time_estimate: fm
            .estimate
            .clone()
            .or_else(|| estimate_from_body(&document.body)),
    }
}

fn resolve_title(document: &Document) -> String {
    document
        .front_matter
        .title
        .clone()
        .or_else(|| first_h1(&document.body))
        .or_else(|| {
            document
                .file_stem()
                .map(title_from_stem)
                .filter(|title| !title.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned())
}

/// Plain text of the first level-1 heading.
pub fn first_h1(markdown: &str) -> Option<String> {
    let mut in_h1 = false;
    let mut title = String::new();

    for event in Parser::new_ext(markdown, parser_options()) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_h1 = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if !title.trim().is_empty() {
                    return Some(title.trim().to_owned());
                }
                in_h1 = false;
                title.clear();
            }
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) if in_h1 => {
                title.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak if in_h1 => title.push(' '),
            _ => {}
        }
    }
    None
}

/// Estimate from an `Estimated Time Frame` line, e.g. `3-5 days` gives `5d`.
pub fn estimate_from_body(markdown: &str) -> Option<String> {
    let line = markdown
        .lines()
        .find(|line| line.contains("Estimated Time Frame"))?;

    if let Some(caps) = DAY_RANGE.captures(line) {
        let low: u64 = caps[1].parse().ok()?;
        let high: u64 = caps[2].parse().ok()?;
        return Some(format!("{}d", low.max(high)));
    }
    let caps = DAYS.captures(line)?;
    let days: u64 = caps[1].parse().ok()?;
    Some(format!("{days}d"))
}

/// Body text before the first `Estimated Time Frame` line.
///
/// Returns the whole body when no such line exists.
pub fn before_estimate(markdown: &str) -> &str {
    let mut offset = 0;
    for line in markdown.split_inclusive('\n') {
        if line.contains("Estimated Time Frame") {
            return markdown[..offset].trim_end();
        }
        offset += line.len();
    }
    markdown
}
