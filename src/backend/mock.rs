// src/backend/mock.rs
//! Deterministic backend for tests and local runs (`AI_TEST_MODE=mock`).

use anyhow::{anyhow, bail, Result};
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{FragmentStream, Generation, NewsBackend};
use crate::sources::Source;

const CANNED_BATCH: &str = "以下是最新新闻：
START_ARTICLE
CATEGORY: 政治
TITLE: 阿曼外交大臣会见伊朗代表团
SOURCE: Times of Oman
TIME: 2小时前
SUMMARY: 双方就地区安全与航运合作交换了意见，并同意继续保持沟通渠道。
END_ARTICLE
START_ARTICLE
CATEGORY: 经济
TITLE: 阿曼公布新一轮港口投资计划
SOURCE: Oman Observer
TIME: 今天上午
SUMMARY: 计划涵盖杜库姆港扩建与物流园区建设，
预计吸引多方外资参与。
END_ARTICLE
";

const CANNED_BODY: [&str; 3] = [
    "阿曼外交部当天发表声明称，",
    "双方在会谈中重申尊重地区国家主权。\n\n",
    "分析人士认为，此次会见释放出积极信号。",
];

pub struct MockBackend {
    batch: Mutex<Result<Generation, String>>,
    fragments: Vec<String>,
    /// Fail the stream after this many fragments (`Some(0)`: fail before any).
    fail_stream_after: Option<usize>,
    fail_stream_open: bool,
    batch_calls: AtomicUsize,
    stream_calls: AtomicUsize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            batch: Mutex::new(Ok(Generation {
                text: CANNED_BATCH.to_string(),
                citations: vec![
                    Source::new("Times of Oman", "https://timesofoman.com/article/1"),
                    Source::new("Oman Observer", "https://www.omanobserver.om/article/2"),
                    Source::new("Times of Oman (dup)", "https://timesofoman.com/article/1"),
                ],
            })),
            fragments: CANNED_BODY.iter().map(|s| s.to_string()).collect(),
            fail_stream_after: None,
            fail_stream_open: false,
            batch_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
        }
    }
}

impl MockBackend {
    pub fn with_batch_text(self, text: impl Into<String>, citations: Vec<Source>) -> Self {
        self.set_batch_text(text, citations);
        self
    }

    /// Replace the canned batch (e.g. between a first load and a forced refresh).
    pub fn set_batch_text(&self, text: impl Into<String>, citations: Vec<Source>) {
        let mut g = self.batch_slot();
        *g = Ok(Generation {
            text: text.into(),
            citations,
        });
    }

    pub fn failing_batch(self, message: impl Into<String>) -> Self {
        self.set_batch_failure(message);
        self
    }

    pub fn set_batch_failure(&self, message: impl Into<String>) {
        let mut g = self.batch_slot();
        *g = Err(message.into());
    }

    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    pub fn failing_stream_after(mut self, fragments: usize) -> Self {
        self.fail_stream_after = Some(fragments);
        self
    }

    pub fn failing_stream_open(mut self) -> Self {
        self.fail_stream_open = true;
        self
    }

    fn batch_slot(&self) -> MutexGuard<'_, Result<Generation, String>> {
        match self.batch.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NewsBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<Generation> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let g = self.batch_slot();
        (*g).clone().map_err(|m| anyhow!("{m}"))
    }

    async fn generate_stream(&self, _prompt: &str) -> Result<FragmentStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stream_open {
            bail!("mock: connection refused");
        }
        let mut items: Vec<Result<String>> = Vec::with_capacity(self.fragments.len() + 1);
        for (i, f) in self.fragments.iter().enumerate() {
            if self.fail_stream_after == Some(i) {
                items.push(Err(anyhow!("mock: stream reset")));
                return Ok(Box::pin(stream::iter(items)));
            }
            items.push(Ok(f.clone()));
        }
        if self.fail_stream_after.is_some_and(|n| n >= self.fragments.len()) {
            items.push(Err(anyhow!("mock: stream reset")));
        }
        Ok(Box::pin(stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
