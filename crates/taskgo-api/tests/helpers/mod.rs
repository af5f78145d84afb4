//! Shared test helpers for HTTP-level tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use taskgo_api::{AppState, build_app};
use taskgo_core::config::{AppConfig, RateLimitConfig};
use taskgo_limiter::{BucketPolicy, VisitorRegistry};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Registry shared with the admission middleware
    pub visitors: Arc<VisitorRegistry>,
}

/// Captured response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    /// App whose buckets hold `capacity` tokens refilled at `per_second`.
    pub fn with_policy(capacity: u32, per_second: f64) -> Self {
        Self::build(
            AppConfig::default(),
            BucketPolicy::new(capacity, per_second).expect("valid policy"),
        )
    }

    /// App built from a rate limit configuration.
    pub fn from_rate_limit(rate_limit: RateLimitConfig) -> Self {
        let policy = BucketPolicy::from_config(&rate_limit).expect("valid policy");
        let config = AppConfig {
            rate_limit,
            ..AppConfig::default()
        };
        Self::build(config, policy)
    }

    fn build(config: AppConfig, policy: BucketPolicy) -> Self {
        let visitors = Arc::new(VisitorRegistry::new(policy));
        let router = build_app(AppState::new(config, Arc::clone(&visitors)));
        Self { router, visitors }
    }

    /// Sends `GET path` as if from `peer`.
    pub async fn get_from(&self, path: &str, peer: SocketAddr) -> TestResponse {
        let mut request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        self.send(request).await
    }

    /// Sends an arbitrary request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }
}

/// Socket address for `ip` with an arbitrary port.
pub fn peer(ip: [u8; 4], port: u16) -> SocketAddr {
    SocketAddr::from((ip, port))
}
