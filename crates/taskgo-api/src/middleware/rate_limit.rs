//! Per-client token bucket admission middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use taskgo_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

use super::client_ip::client_identity;

/// Message carried by every admission rejection.
pub const TOO_MANY_REQUESTS: &str = "Too Many Requests";

/// Admits or rejects the request based on its client's token bucket.
///
/// Every request, admitted or not, refreshes the client's last-seen time so a
/// client hammering the server is never reclaimed mid-flood. Rejected
/// requests never reach downstream handlers.
pub async fn admission(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let identity = client_identity(&request);

    if !state.visitors.check(&identity) {
        debug!(client = %identity, path = %request.uri().path(), "Request rate limited");
        return ApiError::from(AppError::rate_limit(TOO_MANY_REQUESTS)).into_response();
    }

    next.run(request).await
}
