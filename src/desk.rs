// src/desk.rs
//! # News desk
//! Drives the reader-facing flow: topic selection, batch loading through the
//! regional cache, and streamed article bodies.
//!
//! All state lives behind one mutex that is only held for short synchronous
//! sections, never across an upstream call. A batch response always lands in
//! the cache of the topic it was requested for; it is only *displayed* when
//! that topic is still active and no newer load for it was issued.

use chrono::{Local, Utc};
use futures::stream::{self, Stream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::{DynBackend, FragmentStream};
use crate::cache::{CacheEntry, RegionalCache};
use crate::metrics;
use crate::parse::parse_batch;
use crate::prompt::{batch_prompt_with_min, detail_prompt, DEFAULT_MIN_ARTICLES};
use crate::sources::{dedup_sources, Source};
use crate::stream::{Snapshot, SnapshotStream, StreamStatus};
use crate::topic::Topic;
use crate::types::{Article, CategoryCount};
use crate::view::{
    category_slices, feed_status, updated_label, DetailView, NewsView, SourceView,
    BATCH_FAILURE_MESSAGE,
};

#[derive(Debug, Default)]
struct DeskState {
    active: Topic,
    cache: RegionalCache,
    articles: Vec<Article>,
    sources: Vec<Source>,
    categories: Vec<CategoryCount>,
    last_updated: Option<chrono::DateTime<Utc>>,
    loading: bool,
    error: Option<String>,
    load_seq: u64,
    /// Ticket of the newest load per topic; older completions are ignored.
    latest_load: HashMap<Topic, u64>,
    detail: Option<DetailState>,
    detail_seq: u64,
}

#[derive(Debug)]
struct DetailState {
    ticket: u64,
    article: Article,
    snapshot: Snapshot,
}

impl DeskState {
    fn show(&mut self, entry: &CacheEntry) {
        self.articles = entry.articles.clone();
        self.sources = entry.sources.clone();
        self.categories = entry.categories.clone();
        self.last_updated = Some(entry.timestamp);
    }

    fn clear_feed(&mut self) {
        self.articles.clear();
        self.sources.clear();
        self.categories.clear();
    }

    fn view(&self) -> NewsView {
        NewsView {
            topic: self.active,
            topics: Topic::ALL.to_vec(),
            status: feed_status(self.loading, self.error.as_deref(), self.articles.len()),
            loading: self.loading,
            error: self.error.clone(),
            articles: self.articles.clone(),
            sources: self.sources.iter().map(SourceView::from).collect(),
            categories: category_slices(&self.categories),
            last_updated: self.last_updated,
            last_updated_label: self.last_updated.map(updated_label),
        }
    }

    /// Displayed articles first, then every cached topic.
    fn find_article(&self, id: &str) -> Option<(Topic, Article)> {
        if let Some(a) = self.articles.iter().find(|a| a.id == id) {
            return Some((self.active, a.clone()));
        }
        self.cache.find_article(id).map(|(t, a)| (t, a.clone()))
    }
}

/// Receiving end of an opened article.
pub struct DetailHandle {
    pub topic: Topic,
    pub article: Article,
    updates: watch::Receiver<Snapshot>,
}

impl DetailHandle {
    fn ready(topic: Topic, article: Article, snapshot: Snapshot) -> Self {
        // Sender dropped right away: the receiver keeps the final value.
        let (_tx, updates) = watch::channel(snapshot);
        Self {
            topic,
            article,
            updates,
        }
    }

    /// Latest snapshot without waiting.
    pub fn current(&self) -> Snapshot {
        self.updates.borrow().clone()
    }

    /// Wait for the terminal snapshot.
    pub async fn finished(mut self) -> Snapshot {
        loop {
            {
                let snap = self.updates.borrow_and_update();
                if snap.is_terminal() {
                    return snap.clone();
                }
            }
            if self.updates.changed().await.is_err() {
                return self.updates.borrow().clone();
            }
        }
    }

    /// Snapshots as they are published, ending with the terminal one.
    /// Intermediate snapshots may be skipped; each one replaces the previous.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send + 'static {
        stream::unfold((self.updates, false, true), |(mut rx, done, first)| async move {
            if done {
                return None;
            }
            if !first && rx.changed().await.is_err() {
                let last = rx.borrow().clone();
                return last.is_terminal().then_some((last, (rx, true, false)));
            }
            let snap = rx.borrow_and_update().clone();
            let done = snap.is_terminal();
            Some((snap, (rx, done, false)))
        })
    }
}

#[derive(Clone)]
pub struct NewsDesk {
    backend: DynBackend,
    state: Arc<Mutex<DeskState>>,
    min_articles: u32,
}

impl NewsDesk {
    pub fn new(backend: DynBackend) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(DeskState::default())),
            min_articles: DEFAULT_MIN_ARTICLES,
        }
    }

    pub fn with_topic(self, topic: Topic) -> Self {
        self.lock().active = topic;
        self
    }

    pub fn with_min_articles(mut self, min_articles: u32) -> Self {
        self.min_articles = min_articles.max(1);
        self
    }

    /// Start from an existing cache (e.g. a pre-seeded one in tests).
    pub fn with_cache(self, cache: RegionalCache) -> Self {
        self.lock().cache = cache;
        self
    }

    fn lock(&self) -> MutexGuard<'_, DeskState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn active_topic(&self) -> Topic {
        self.lock().active
    }

    pub fn view(&self) -> NewsView {
        self.lock().view()
    }

    pub fn cache_entry(&self, topic: Topic) -> Option<CacheEntry> {
        self.lock().cache.get(topic).cloned()
    }

    /// Make `topic` active and show it, from cache when possible.
    pub async fn select_topic(&self, topic: Topic) -> NewsView {
        self.open_topic(topic, false).await
    }

    /// Make `topic` active and load it, bypassing the cache when `force`.
    pub async fn open_topic(&self, topic: Topic, force: bool) -> NewsView {
        {
            let mut st = self.lock();
            if st.active != topic {
                debug!(from = %st.active, to = %topic, "topic switch");
                st.active = topic;
            }
        }
        self.load_news(topic, force).await
    }

    /// Forced reload of the active topic.
    pub async fn refresh(&self) -> NewsView {
        let topic = self.active_topic();
        self.load_news(topic, true).await
    }

    pub async fn load_news(&self, topic: Topic, force: bool) -> NewsView {
        let ticket = {
            let mut st = self.lock();
            let shown = st.active == topic;

            if !force {
                if let Some(entry) = st.cache.get(topic).cloned() {
                    metrics::record_cache_hit(topic);
                    if shown {
                        st.show(&entry);
                        st.loading = false;
                        st.error = None;
                    }
                    return st.view();
                }
            }

            st.load_seq += 1;
            let ticket = st.load_seq;
            st.latest_load.insert(topic, ticket);
            if shown {
                st.error = None;
                st.loading = true;
                st.clear_feed();
            }
            ticket
        };

        let prompt = batch_prompt_with_min(topic, Local::now().date_naive(), self.min_articles);
        let started = Instant::now();
        let result = self.backend.generate(&prompt.text).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut st = self.lock();
        let latest = st.latest_load.get(&topic) == Some(&ticket);
        let shown = latest && st.active == topic;

        match result {
            Ok(generation) => {
                let parsed = parse_batch(topic, &generation.text);
                metrics::record_batch(topic, elapsed_ms, parsed.articles.len(), parsed.dropped);
                info!(
                    topic = %topic,
                    articles = parsed.articles.len(),
                    dropped = parsed.dropped,
                    citations = generation.citations.len(),
                    elapsed_ms,
                    "batch loaded"
                );
                if latest {
                    let entry = CacheEntry {
                        articles: parsed.articles,
                        sources: dedup_sources(generation.citations),
                        categories: parsed.categories,
                        timestamp: Utc::now(),
                    };
                    if shown {
                        st.show(&entry);
                    }
                    st.cache.put(topic, entry);
                } else {
                    debug!(topic = %topic, ticket, "superseded batch discarded");
                }
            }
            Err(e) => {
                metrics::record_batch_error(topic);
                warn!(error = ?e, topic = %topic, "batch fetch failed");
                if shown {
                    st.error = Some(BATCH_FAILURE_MESSAGE.to_string());
                }
            }
        }

        if shown {
            st.loading = false;
        }
        st.view()
    }

    /// Open an article. A cached body is returned as-is; otherwise a detail
    /// stream is started in the background and published through the handle.
    pub fn read_more(&self, article_id: &str) -> anyhow::Result<DetailHandle> {
        let mut st = self.lock();
        let Some((topic, article)) = st.find_article(article_id) else {
            anyhow::bail!("unknown article id {article_id}");
        };

        st.detail_seq += 1;
        let ticket = st.detail_seq;

        if let Some(content) = article.content.clone().filter(|c| !c.is_empty()) {
            let snap = Snapshot::completed(content);
            st.detail = Some(DetailState {
                ticket,
                article: article.clone(),
                snapshot: snap.clone(),
            });
            return Ok(DetailHandle::ready(topic, article, snap));
        }

        let initial = Snapshot::streaming(String::new());
        st.detail = Some(DetailState {
            ticket,
            article: article.clone(),
            snapshot: initial.clone(),
        });
        drop(st);

        let (tx, updates) = watch::channel(initial);
        let desk = self.clone();
        let task_article = article.clone();
        tokio::spawn(async move { desk.drive_detail(ticket, topic, task_article, tx).await });

        Ok(DetailHandle {
            topic,
            article,
            updates,
        })
    }

    async fn drive_detail(
        &self,
        ticket: u64,
        topic: Topic,
        article: Article,
        tx: watch::Sender<Snapshot>,
    ) {
        let prompt = detail_prompt(&article.title, Local::now().date_naive());
        let fragments: FragmentStream = match self.backend.generate_stream(&prompt).await {
            Ok(s) => s,
            Err(e) => Box::pin(stream::once(async move { Err::<String, anyhow::Error>(e) })),
        };

        let mut snapshots = SnapshotStream::new(fragments);
        while let Some(snap) = snapshots.next().await {
            let terminal = snap.is_terminal();
            if terminal {
                self.finish_detail(topic, &article, &snap);
            }
            self.mirror_detail(ticket, &snap);
            // Runs to completion even when nobody is watching any more.
            tx.send_replace(snap);
            if terminal {
                break;
            }
        }
    }

    fn mirror_detail(&self, ticket: u64, snap: &Snapshot) {
        let mut st = self.lock();
        if let Some(d) = st.detail.as_mut().filter(|d| d.ticket == ticket) {
            d.snapshot = snap.clone();
            if let (StreamStatus::Completed, false) = (&snap.status, snap.text.is_empty()) {
                d.article = d.article.with_content(snap.text.clone());
            }
        }
    }

    /// Persist a completed body onto the displayed article and the topic cache.
    fn finish_detail(&self, topic: Topic, article: &Article, snap: &Snapshot) {
        metrics::record_detail_stream(snap.is_failed());
        match &snap.status {
            StreamStatus::Failed(reason) => {
                warn!(
                    topic = %topic,
                    article = %article.id,
                    partial_chars = snap.text.chars().count(),
                    reason = %reason,
                    "detail stream failed"
                );
                return;
            }
            StreamStatus::Completed if snap.text.is_empty() => {
                warn!(topic = %topic, article = %article.id, "detail stream completed empty");
                return;
            }
            _ => {}
        }

        let mut st = self.lock();
        // Ids are reassigned on refresh; only patch the article this body was written for.
        let same = |a: &Article| a.id == article.id && a.title == article.title;

        if st.active == topic {
            if let Some(a) = st.articles.iter_mut().find(|a| same(a)) {
                *a = a.with_content(snap.text.clone());
            }
        }
        let cached_same = st
            .cache
            .get(topic)
            .and_then(|e| e.articles.iter().find(|a| a.id == article.id))
            .is_some_and(same);
        if cached_same {
            st.cache.patch_article_content(topic, &article.id, &snap.text);
        }
        info!(
            topic = %topic,
            article = %article.id,
            chars = snap.text.chars().count(),
            cached = cached_same,
            "detail body stored"
        );
    }

    pub fn detail_view(&self) -> Option<DetailView> {
        let st = self.lock();
        st.detail.as_ref().map(|d| {
            DetailView::new(
                d.article.clone(),
                d.snapshot.display_text(),
                d.snapshot.status.clone(),
            )
        })
    }

    /// Detach the detail view. A running stream is not cancelled.
    pub fn close_detail(&self) {
        self.lock().detail = None;
    }
}
