// src/types.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,     // e.g., "news-阿曼-0"
    pub category: String,
    pub title: String,
    pub summary: String,
    /// Full streamed body; absent until a detail stream completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>, // e.g., "Al Jazeera"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,   // e.g., "2小时前"
}

impl Article {
    /// Copy of this article carrying `content`.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..self.clone()
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}
