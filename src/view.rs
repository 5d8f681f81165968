// src/view.rs
//! Rendered output contract handed to the front-end: the feed for the active
//! topic and the expanded article view.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::sources::Source;
use crate::stream::StreamStatus;
use crate::topic::Topic;
use crate::types::{Article, CategoryCount};

pub const BATCH_FAILURE_MESSAGE: &str = "获取新闻失败，请稍后重试。";
pub const GENERATED_NOTE: &str = "由 Gemini AI 基于实时搜索结果生成";

/// Paragraphs carrying these markers repeat card metadata and are not shown.
const ATTRIBUTION_MARKERS: [&str; 2] = ["来源：", "发布时间："];

/// Category chart palette, cycled by position.
pub const CHART_COLORS: [&str; 6] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#DB161B", "#8884d8",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    /// Nothing to show yet; render skeleton cards.
    Loading,
    Ready,
    /// Fetch succeeded with zero articles; offer a forced refresh.
    Empty,
    /// Fetch failed; offer a retry.
    Failed,
}

pub fn feed_status(loading: bool, error: Option<&str>, articles: usize) -> FeedStatus {
    if loading && articles == 0 {
        FeedStatus::Loading
    } else if error.is_some() {
        FeedStatus::Failed
    } else if articles > 0 {
        FeedStatus::Ready
    } else {
        FeedStatus::Empty
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceView {
    pub title: String,
    pub uri: String,
    pub hostname: Option<String>,
}

impl From<&Source> for SourceView {
    fn from(s: &Source) -> Self {
        Self {
            title: s.title.clone(),
            uri: s.uri.clone(),
            hostname: s.hostname(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub count: usize,
    pub color: &'static str,
}

pub fn category_slices(categories: &[CategoryCount]) -> Vec<CategorySlice> {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| CategorySlice {
            name: c.name.clone(),
            count: c.count,
            color: CHART_COLORS[i % CHART_COLORS.len()],
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsView {
    pub topic: Topic,
    pub topics: Vec<Topic>,
    pub status: FeedStatus,
    pub loading: bool,
    pub error: Option<String>,
    pub articles: Vec<Article>,
    pub sources: Vec<SourceView>,
    pub categories: Vec<CategorySlice>,
    pub last_updated: Option<DateTime<Utc>>,
    /// "HH:MM" in local time.
    pub last_updated_label: Option<String>,
}

pub fn updated_label(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub article: Article,
    pub loading_content: bool,
    /// Full body as shown, failure notice included.
    pub text: String,
    pub paragraphs: Vec<String>,
    pub status: StreamStatus,
    pub generated_note: Option<&'static str>,
}

impl DetailView {
    pub fn new(article: Article, text: String, status: StreamStatus) -> Self {
        let loading_content = matches!(status, StreamStatus::Streaming);
        let paragraphs = body_paragraphs(&text);
        let generated_note = (!loading_content && !text.is_empty()).then_some(GENERATED_NOTE);
        Self {
            article,
            loading_content,
            text,
            paragraphs,
            status,
            generated_note,
        }
    }
}

/// Split a body on blank lines, dropping empty and attribution-only paragraphs.
pub fn body_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| !ATTRIBUTION_MARKERS.iter().any(|m| p.contains(m)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_skip_attribution_and_blank_runs() {
        let body = "第一段。\n\n来源：新华社\n\n\n\n第二段。\n\n发布时间：今天";
        assert_eq!(body_paragraphs(body), vec!["第一段。", "第二段。"]);
        assert!(body_paragraphs("").is_empty());
    }

    #[test]
    fn status_precedence_matches_feed_rendering() {
        assert_eq!(feed_status(true, None, 0), FeedStatus::Loading);
        assert_eq!(feed_status(true, None, 3), FeedStatus::Ready);
        assert_eq!(feed_status(false, Some("x"), 0), FeedStatus::Failed);
        assert_eq!(feed_status(false, None, 0), FeedStatus::Empty);
    }

    #[test]
    fn palette_cycles() {
        let cats: Vec<CategoryCount> = (0..7)
            .map(|i| CategoryCount {
                name: format!("c{i}"),
                count: 1,
            })
            .collect();
        let slices = category_slices(&cats);
        assert_eq!(slices[0].color, "#0088FE");
        assert_eq!(slices[6].color, "#0088FE");
    }
}
