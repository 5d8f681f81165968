// src/sources.rs
//! Grounding citations returned alongside a batch, and their deduplication.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_SOURCE_TITLE: &str = "News Source";
pub const DEFAULT_SOURCE_URI: &str = "#";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

impl Source {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }

    /// Build from possibly missing citation fields.
    pub fn from_citation(title: Option<&str>, uri: Option<&str>) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SOURCE_TITLE);
        let uri = uri
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_SOURCE_URI);
        Self::new(title, uri)
    }

    /// Host part of the uri, if it parses as an absolute URL.
    pub fn hostname(&self) -> Option<String> {
        reqwest::Url::parse(&self.uri)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

/// One entry per distinct uri; the first occurrence (and its title) wins.
pub fn dedup_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen: HashSet<String> = HashSet::with_capacity(sources.len());
    let mut keep = Vec::with_capacity(sources.len());
    for s in sources {
        if seen.insert(s.uri.clone()) {
            keep.push(s);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_citation_fields_get_defaults() {
        let s = Source::from_citation(None, Some("  "));
        assert_eq!(s, Source::new("News Source", "#"));
    }

    #[test]
    fn hostname_only_for_absolute_urls() {
        let s = Source::new("Times of Oman", "https://timesofoman.com/article/1");
        assert_eq!(s.hostname().as_deref(), Some("timesofoman.com"));
        assert_eq!(Source::new("x", "#").hostname(), None);
    }
}
