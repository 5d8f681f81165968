// src/api.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::desk::NewsDesk;
use crate::stream::Snapshot;
use crate::topic::Topic;
use crate::view::{DetailView, NewsView};

#[derive(Clone)]
pub struct AppState {
    pub desk: NewsDesk,
}

pub fn router(desk: NewsDesk) -> Router {
    let state = AppState { desk };

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/topics", get(topics))
        .route("/api/news", get(news))
        .route("/api/state", get(current_state))
        .route("/api/refresh", post(refresh))
        .route("/api/articles/{id}/stream", get(article_stream))
        .route("/api/detail", get(detail).delete(close_detail))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct TopicsResp {
    active: Topic,
    topics: Vec<TopicOut>,
}

#[derive(Serialize)]
struct TopicOut {
    label: &'static str,
    search_context: &'static str,
}

async fn topics(State(state): State<AppState>) -> Json<TopicsResp> {
    Json(TopicsResp {
        active: state.desk.active_topic(),
        topics: Topic::ALL
            .into_iter()
            .map(|t| TopicOut {
                label: t.label(),
                search_context: t.search_context(),
            })
            .collect(),
    })
}

#[derive(Deserialize)]
struct NewsQuery {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    refresh: Option<bool>,
}

async fn news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Json<NewsView> {
    let topic = match q.topic.as_deref() {
        Some(label) => Topic::from_label_or_default(label),
        None => state.desk.active_topic(),
    };
    Json(state.desk.open_topic(topic, q.refresh.unwrap_or(false)).await)
}

async fn current_state(State(state): State<AppState>) -> Json<NewsView> {
    Json(state.desk.view())
}

async fn refresh(State(state): State<AppState>) -> Json<NewsView> {
    Json(state.desk.refresh().await)
}

/// One SSE `snapshot` event: the raw snapshot plus the text as a reader sees it.
#[derive(Serialize)]
struct SnapshotEvent {
    #[serde(flatten)]
    snapshot: Snapshot,
    display: String,
}

impl From<Snapshot> for SnapshotEvent {
    fn from(snapshot: Snapshot) -> Self {
        let display = snapshot.display_text();
        Self { snapshot, display }
    }
}

async fn article_stream(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let handle = match state.desk.read_more(&id) {
        Ok(h) => h,
        Err(e) => {
            debug!(error = %e, "article stream rejected");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let events = handle
        .into_stream()
        .map(|snap| {
            Event::default()
                .event("snapshot")
                .json_data(SnapshotEvent::from(snap))
        });
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn detail(State(state): State<AppState>) -> Result<Json<DetailView>, StatusCode> {
    state.desk.detail_view().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn close_detail(State(state): State<AppState>) -> StatusCode {
    state.desk.close_detail();
    StatusCode::NO_CONTENT
}
