// src/lib.rs
// Public library surface for the service binary, the terminal client and integration tests.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod desk;
pub mod metrics;
pub mod parse;
pub mod prompt;
pub mod sources;
pub mod stream;
pub mod topic;
pub mod types;
pub mod view;

// ---- Re-exports for stable public API ----
pub use crate::cache::{CacheEntry, RegionalCache};
pub use crate::desk::{DetailHandle, NewsDesk};
pub use crate::parse::{parse_batch, ParsedBatch};
pub use crate::sources::{dedup_sources, Source};
pub use crate::stream::{Snapshot, SnapshotStream, Snapshots, StreamStatus};
pub use crate::topic::Topic;
pub use crate::types::{Article, CategoryCount};

use axum::Router;
use tracing::info;

/// Build the desk described by `cfg` (backend chosen by `backend::build_backend`).
pub fn desk_from_config(cfg: &config::KaleidoscopeConfig) -> anyhow::Result<NewsDesk> {
    let backend = backend::build_backend(cfg)?;
    Ok(NewsDesk::new(backend)
        .with_topic(cfg.initial_topic())
        .with_min_articles(cfg.min_articles))
}

/// Full in-process app: config from disk/env, backend, desk, routes, and
/// `/metrics` when enabled.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::load_default()?;
    let desk = desk_from_config(&cfg)?;
    info!(
        backend = desk.backend_name(),
        topic = %desk.active_topic(),
        metrics = cfg.metrics,
        "app ready"
    );

    let mut router = api::router(desk);
    if cfg.metrics {
        let m = metrics::Metrics::init()?;
        router = router.merge(m.router());
    }
    Ok(router)
}
