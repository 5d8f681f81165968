// src/parse.rs
//! Parser for the delimited headline format the batch prompt asks for.
//!
//! The text is cut into segments on `START_ARTICLE`; each segment body ends at
//! `END_ARTICLE` (or the next segment / end of input). Inside a body, fields are
//! `LABEL: value` lines. `SUMMARY` is the only multi-line field: it takes its
//! inline value plus every following line of the body.
//!
//! A segment becomes an article only with a non-empty title and summary;
//! anything else is counted in `dropped` and otherwise ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::topic::Topic;
use crate::types::{Article, CategoryCount};

pub const START_MARKER: &str = "START_ARTICLE";
pub const END_MARKER: &str = "END_ARTICLE";

pub const DEFAULT_CATEGORY: &str = "综合";
pub const DEFAULT_SOURCE: &str = "未知来源";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Category,
    Title,
    Source,
    Time,
    Summary,
}

// Leading markdown decoration (`**TITLE:**`, `- TITLE:`) is tolerated, and so is the full-width colon.
static RE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s*#>\-]*(CATEGORY|TITLE|SOURCE|TIME|SUMMARY)\**\s*[:：]\**\s*(.*)$")
        .expect("field regex")
});

fn field_line(line: &str) -> Option<(Label, &str)> {
    let caps = RE_FIELD.captures(line)?;
    let label = match caps.get(1)?.as_str() {
        "CATEGORY" => Label::Category,
        "TITLE" => Label::Title,
        "SOURCE" => Label::Source,
        "TIME" => Label::Time,
        _ => Label::Summary,
    };
    Some((label, caps.get(2).map_or("", |m| m.as_str())))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    pub articles: Vec<Article>,
    pub categories: Vec<CategoryCount>,
    /// Segments rejected for a missing title or summary.
    pub dropped: usize,
}

impl ParsedBatch {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Fields pulled out of one segment before acceptance.
#[derive(Debug, Default)]
struct RawFields {
    category: Option<String>,
    title: Option<String>,
    source: Option<String>,
    time: Option<String>,
    summary: Option<String>,
}

impl RawFields {
    fn is_open(&self, label: Label) -> bool {
        match label {
            Label::Category => self.category.is_none(),
            Label::Title => self.title.is_none(),
            Label::Source => self.source.is_none(),
            Label::Time => self.time.is_none(),
            Label::Summary => false,
        }
    }
}

fn clean(value: &str) -> String {
    let v = value.trim();
    if v.contains('&') {
        html_escape::decode_html_entities(v).trim().to_string()
    } else {
        v.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn read_segment(segment: &str) -> RawFields {
    let body = match segment.find(END_MARKER) {
        Some(end) => &segment[..end],
        None => segment,
    };

    let mut fields = RawFields::default();
    let mut summary: Option<Vec<&str>> = None;
    let mut in_summary = false;

    for line in body.lines() {
        let field = field_line(line);
        if in_summary {
            // The summary runs on until a single-line label that is still unset.
            if !field.is_some_and(|(label, _)| fields.is_open(label)) {
                if let Some(lines) = summary.as_mut() {
                    lines.push(line);
                }
                continue;
            }
            in_summary = false;
        }
        let Some((label, value)) = field else {
            continue;
        };
        let slot = match label {
            Label::Category => &mut fields.category,
            Label::Title => &mut fields.title,
            Label::Source => &mut fields.source,
            Label::Time => &mut fields.time,
            Label::Summary => {
                if summary.is_none() {
                    summary = Some(vec![value]);
                    in_summary = true;
                }
                continue;
            }
        };
        let value = clean(value);
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value);
        }
    }

    fields.summary = summary.map(|lines| clean(&lines.join("\n")));
    fields
}

/// Parse a raw batch response for `topic`.
///
/// Empty input or input without a single valid segment yields an empty batch.
pub fn parse_batch(topic: Topic, text: &str) -> ParsedBatch {
    let mut out = ParsedBatch::default();
    let mut category_index: HashMap<String, usize> = HashMap::new();

    // Everything before the first marker is preamble.
    for segment in text.split(START_MARKER).skip(1) {
        let fields = read_segment(segment);
        let (Some(title), Some(summary)) = (non_empty(fields.title), non_empty(fields.summary))
        else {
            out.dropped += 1;
            continue;
        };

        let category = non_empty(fields.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let source = non_empty(fields.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let time = fields.time.unwrap_or_default();

        match category_index.get(&category) {
            Some(&i) => out.categories[i].count += 1,
            None => {
                category_index.insert(category.clone(), out.categories.len());
                out.categories.push(CategoryCount {
                    name: category.clone(),
                    count: 1,
                });
            }
        }

        let id = article_id(topic, out.articles.len());
        out.articles.push(Article {
            id,
            category,
            title,
            summary,
            content: None,
            source: Some(source),
            time: Some(time),
        });
    }

    out
}

pub fn article_id(topic: Topic, position: usize) -> String {
    format!("news-{}-{}", topic.label(), position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_line_accepts_decorated_labels() {
        assert_eq!(
            field_line("**TITLE:** 阿曼苏丹会见来宾"),
            Some((Label::Title, "阿曼苏丹会见来宾"))
        );
        assert_eq!(field_line("- SOURCE：Times of Oman"), Some((Label::Source, "Times of Oman")));
        assert_eq!(field_line("SUBTITLE: nope"), None);
        assert_eq!(field_line("The TITLE: is inline"), None);
    }

    #[test]
    fn first_occurrence_of_a_label_wins() {
        let f = read_segment("\nTITLE: 一\nTITLE: 二\nSUMMARY: 摘要\n");
        assert_eq!(f.title.as_deref(), Some("一"));
    }

    #[test]
    fn summary_absorbs_following_lines_until_end_marker() {
        let f = read_segment("\nTITLE: t\nSUMMARY: 第一行\n第二行\nEND_ARTICLE\n杂项");
        assert_eq!(f.summary.as_deref(), Some("第一行\n第二行"));
    }

    #[test]
    fn entities_are_decoded() {
        let f = read_segment("\nTITLE: AT&amp;T &quot;deal&quot;\nSUMMARY: s");
        assert_eq!(f.title.as_deref(), Some("AT&T \"deal\""));
    }
}
