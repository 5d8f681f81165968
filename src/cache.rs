// src/cache.rs
//! Regional cache: the last successful batch per topic.
//!
//! Entries are replaced wholesale on refresh. The only in-place change is
//! attaching a streamed body to one article. No interior locking here; the
//! owner decides how the cache is shared.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::sources::Source;
use crate::topic::Topic;
use crate::types::{Article, CategoryCount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub articles: Vec<Article>,
    pub sources: Vec<Source>,
    pub categories: Vec<CategoryCount>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct RegionalCache {
    entries: HashMap<Topic, CacheEntry>,
}

impl RegionalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, topic: Topic) -> Option<&CacheEntry> {
        self.entries.get(&topic)
    }

    /// Replace the entry for `topic`, returning the previous one.
    pub fn put(&mut self, topic: Topic, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(topic, entry)
    }

    /// Attach `content` to the article `article_id` of `topic`.
    ///
    /// Returns `true` when an article was patched. No entry (or no such id)
    /// leaves the cache exactly as it was.
    pub fn patch_article_content(&mut self, topic: Topic, article_id: &str, content: &str) -> bool {
        let Some(entry) = self.entries.get_mut(&topic) else {
            return false;
        };
        match entry.articles.iter_mut().find(|a| a.id == article_id) {
            Some(article) => {
                *article = article.with_content(content);
                true
            }
            None => false,
        }
    }

    /// Locate an article by id across all topics.
    pub fn find_article(&self, article_id: &str) -> Option<(Topic, &Article)> {
        self.entries.iter().find_map(|(topic, entry)| {
            entry
                .articles
                .iter()
                .find(|a| a.id == article_id)
                .map(|a| (*topic, a))
        })
    }

    pub fn contains(&self, topic: Topic) -> bool {
        self.entries.contains_key(&topic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
