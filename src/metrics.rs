// src/metrics.rs
use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::topic::Topic;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the series.
    pub fn init() -> Result<Self> {
        let handle = HANDLE.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow!("prometheus: install recorder: {e}"))?;
            describe();
            Ok::<_, anyhow::Error>(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("news_batch_fetch_total", "Batch fetches sent upstream.");
    describe_counter!("news_batch_fetch_errors_total", "Batch fetches that failed.");
    describe_counter!("news_cache_hits_total", "Topic loads served from the regional cache.");
    describe_counter!("news_articles_parsed_total", "Articles accepted by the parser.");
    describe_counter!("news_segments_dropped_total", "Segments rejected by the parser.");
    describe_counter!("news_detail_streams_total", "Detail streams started.");
    describe_counter!("news_detail_stream_failures_total", "Detail streams ending in failure.");
    describe_histogram!("news_batch_fetch_ms", "Batch fetch round trip in milliseconds.");
}

// Recording helpers; no-ops until a recorder is installed.

pub(crate) fn record_cache_hit(topic: Topic) {
    counter!("news_cache_hits_total", "topic" => topic.label()).increment(1);
}

pub(crate) fn record_batch(topic: Topic, elapsed_ms: f64, parsed: usize, dropped: usize) {
    counter!("news_batch_fetch_total", "topic" => topic.label()).increment(1);
    histogram!("news_batch_fetch_ms").record(elapsed_ms);
    counter!("news_articles_parsed_total").increment(parsed as u64);
    counter!("news_segments_dropped_total").increment(dropped as u64);
}

pub(crate) fn record_batch_error(topic: Topic) {
    counter!("news_batch_fetch_total", "topic" => topic.label()).increment(1);
    counter!("news_batch_fetch_errors_total", "topic" => topic.label()).increment(1);
}

pub(crate) fn record_detail_stream(failed: bool) {
    counter!("news_detail_streams_total").increment(1);
    if failed {
        counter!("news_detail_stream_failures_total").increment(1);
    }
}
