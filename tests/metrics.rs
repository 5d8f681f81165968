// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use tower::ServiceExt;

// Full in-process app with the mock backend and /metrics enabled.
async fn build_app() -> Router {
    std::env::set_var("AI_TEST_MODE", "mock");
    std::env::set_var("KALEIDOSCOPE_METRICS", "1");
    mideast_kaleidoscope::app()
        .await
        .expect("app() should build Router in tests")
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
#[serial]
async fn metrics_endpoint_counts_batches_and_cache_hits() {
    let app = build_app().await;

    // MISS then HIT for the same topic.
    get_text(&app, "/api/news").await;
    get_text(&app, "/api/news").await;

    let (status, text) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "news_batch_fetch_total",
        "news_cache_hits_total",
        "news_articles_parsed_total",
        "news_batch_fetch_ms",
    ] {
        assert!(text.contains(needle), "missing metric {needle}:\n{text}");
    }
}

#[tokio::test]
#[serial]
async fn app_builds_twice_in_one_process() {
    // Recorder installation is once per process; a second app must still build.
    let a = build_app().await;
    let b = build_app().await;
    assert_eq!(get_text(&a, "/health").await.0, StatusCode::OK);
    assert_eq!(get_text(&b, "/metrics").await.0, StatusCode::OK);
}
