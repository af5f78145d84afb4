//! HTTP-level tests for per-client admission control.

mod helpers;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use taskgo_core::config::RateLimitConfig;
use taskgo_limiter::Reclaimer;

use helpers::{TestApp, peer};

#[tokio::test(start_paused = true)]
async fn test_burst_then_reject_then_refill() {
    let app = TestApp::with_policy(2, 1.0 / 60.0);
    let client = peer([127, 0, 0, 1], 12345);

    let first = app.get_from("/health", client).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.get_from("/health", client).await;
    assert_eq!(second.status, StatusCode::OK);

    let third = app.get_from("/health", client).await;
    assert_eq!(third.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        third.body,
        json!({ "success": false, "error": "Too Many Requests" })
    );

    tokio::time::advance(Duration::from_secs(60)).await;

    let fourth = app.get_from("/health", client).await;
    assert_eq!(fourth.status, StatusCode::OK);

    let fifth = app.get_from("/health", client).await;
    assert_eq!(fifth.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_port_does_not_split_identity() {
    let app = TestApp::with_policy(1, 1.0 / 60.0);

    let first = app.get_from("/health", peer([10, 0, 0, 1], 40000)).await;
    assert_eq!(first.status, StatusCode::OK);

    let other_port = app.get_from("/health", peer([10, 0, 0, 1], 40001)).await;
    assert_eq!(other_port.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.visitors.len(), 1);
    assert!(app.visitors.contains("10.0.0.1"));
}

#[tokio::test(start_paused = true)]
async fn test_clients_are_isolated() {
    let app = TestApp::with_policy(1, 1.0 / 60.0);
    let a = peer([192, 168, 1, 10], 5000);
    let b = peer([192, 168, 1, 11], 5000);

    assert_eq!(app.get_from("/health", a).await.status, StatusCode::OK);
    assert_eq!(
        app.get_from("/health", a).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.get_from("/health", b).await.status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_request_skips_handler() {
    let app = TestApp::with_policy(1, 1.0 / 60.0);
    let client = peer([127, 0, 0, 1], 1);

    let admitted = app.get_from("/health", client).await;
    assert_eq!(admitted.body["success"], json!(true));
    assert_eq!(admitted.body["data"]["status"], json!("ok"));

    let rejected = app.get_from("/health", client).await;
    assert_eq!(rejected.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(rejected.body.get("data").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_route_is_rate_limited_too() {
    let app = TestApp::with_policy(1, 1.0 / 60.0);
    let client = peer([127, 0, 0, 1], 1);

    let missing = app.get_from("/books", client).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["success"], json!(false));

    let limited = app.get_from("/books", client).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_forwarded_header_fallback() {
    let app = TestApp::with_policy(1, 1.0 / 60.0);

    let forwarded = |ip: &'static str| {
        Request::builder()
            .uri("/health")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(
        app.send(forwarded("203.0.113.5")).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.send(forwarded("203.0.113.5")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        app.send(forwarded("203.0.113.6")).await.status,
        StatusCode::OK
    );
    assert!(app.visitors.contains("203.0.113.5"));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_limiter_admits_everything() {
    let app = TestApp::from_rate_limit(RateLimitConfig {
        enabled: false,
        burst: 1,
        ..RateLimitConfig::default()
    });
    let client = peer([127, 0, 0, 1], 1);

    for _ in 0..5 {
        assert_eq!(app.get_from("/health", client).await.status, StatusCode::OK);
    }
    assert!(app.visitors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_idle_client_reclaimed_and_starts_fresh() {
    let app = TestApp::with_policy(2, 1.0 / 3600.0);
    let client = peer([127, 0, 0, 1], 9000);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let reclaimer = Reclaimer::new(
        std::sync::Arc::clone(&app.visitors),
        Duration::from_secs(300),
        Duration::from_secs(60),
    )
    .spawn(shutdown_rx);

    assert_eq!(app.get_from("/health", client).await.status, StatusCode::OK);
    assert_eq!(app.get_from("/health", client).await.status, StatusCode::OK);
    assert_eq!(
        app.get_from("/health", client).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_secs(6 * 60 + 1)).await;
    assert!(!app.visitors.contains("127.0.0.1"));

    assert_eq!(app.get_from("/health", client).await.status, StatusCode::OK);
    assert_eq!(app.get_from("/health", client).await.status, StatusCode::OK);

    shutdown_tx.send(true).unwrap();
    reclaimer.await.unwrap();
}
