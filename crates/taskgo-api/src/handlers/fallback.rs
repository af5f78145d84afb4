//! Handler for unmatched routes.

use axum::http::Uri;

use taskgo_core::error::AppError;

use crate::error::ApiError;

/// Any path without a route.
pub async fn not_found(uri: Uri) -> ApiError {
    AppError::not_found(format!("No route for {}", uri.path())).into()
}
