// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/topics
// - GET /api/news (topic query, cache reuse)
// - GET /api/articles/{id}/stream (SSE snapshots with reader-facing text, 404 on unknown id)
// - GET/DELETE /api/detail

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use std::sync::Arc;
use tower::ServiceExt as _; // for `oneshot`

use mideast_kaleidoscope::api;
use mideast_kaleidoscope::backend::MockBackend;
use mideast_kaleidoscope::NewsDesk;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router() -> (Router, Arc<MockBackend>) {
    router_with(MockBackend::default())
}

fn router_with(mock: MockBackend) -> (Router, Arc<MockBackend>) {
    let mock = Arc::new(mock);
    (api::router(NewsDesk::new(mock.clone())), mock)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let (app, _) = test_router();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn api_topics_lists_all_regions_in_order() {
    let (app, _) = test_router();
    let (status, body) = get(&app, "/api/topics").await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["active"], "阿曼");
    let topics = v["topics"].as_array().expect("topics array");
    assert_eq!(topics.len(), 9);
    assert_eq!(topics[0]["label"], "阿曼");
    assert_eq!(topics[8]["label"], "中国");
    assert!(topics[0]["search_context"].as_str().is_some());
}

#[tokio::test]
async fn api_news_loads_topic_and_reuses_cache() {
    let (app, mock) = test_router();

    // 伊朗
    let (status, body) = get(&app, "/api/news?topic=%E4%BC%8A%E6%9C%97").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["topic"], "伊朗");
    assert_eq!(v["status"], "ready");
    assert_eq!(v["articles"][0]["id"], "news-伊朗-0");
    assert_eq!(v["sources"].as_array().map(Vec::len), Some(2));
    assert!(v["categories"][0]["color"].as_str().is_some());

    get(&app, "/api/news?topic=%E4%BC%8A%E6%9C%97").await;
    assert_eq!(mock.batch_calls(), 1);

    get(&app, "/api/news?topic=%E4%BC%8A%E6%9C%97&refresh=true").await;
    assert_eq!(mock.batch_calls(), 2);

    let (_, state) = get(&app, "/api/state").await;
    let v: Json = serde_json::from_str(&state).expect("json");
    assert_eq!(v["topic"], "伊朗");
}

#[tokio::test]
async fn api_article_stream_emits_snapshot_events() {
    let (app, _) = test_router();
    get(&app, "/api/news").await;

    // news-阿曼-0
    let (status, body) = get(&app, "/api/articles/news-%E9%98%BF%E6%9B%BC-0/stream").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: snapshot"), "body: {body}");
    assert!(body.contains("\"completed\""), "body: {body}");
    assert!(body.contains("此次会见释放出积极信号"));
    assert!(body.contains("\"display\""), "body: {body}");
    assert!(!body.contains("获取详情失败"));

    let (status, detail) = get(&app, "/api/detail").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&detail).expect("json");
    assert_eq!(v["article"]["id"], "news-阿曼-0");
    assert_eq!(v["loading_content"], false);
}

#[tokio::test]
async fn api_article_stream_unknown_id_is_404() {
    let (app, _) = test_router();
    let (status, _) = get(&app, "/api/articles/news-none-0/stream").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_detail_close_returns_no_content() {
    let (app, _) = test_router();
    let (status, _) = get(&app, "/api/detail").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/detail")
        .body(Body::empty())
        .expect("build DELETE");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn api_article_stream_failure_carries_notice_in_display() {
    let (app, _) = router_with(MockBackend::default().failing_stream_after(1));
    get(&app, "/api/news").await;

    let (status, body) = get(&app, "/api/articles/news-%E9%98%BF%E6%9B%BC-0/stream").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"failed\""), "body: {body}");

    let last = body
        .lines()
        .filter_map(|l| l.strip_prefix("data:"))
        .map(str::trim_start)
        .last()
        .expect("at least one data line");
    let v: Json = serde_json::from_str(last).expect("snapshot json");
    assert_eq!(v["text"], "阿曼外交部当天发表声明称，");
    let display = v["display"].as_str().expect("display field");
    assert!(display.starts_with("阿曼外交部当天发表声明称，"));
    assert!(display.ends_with("[获取详情失败，请检查网络连接或稍后重试]"));
}
