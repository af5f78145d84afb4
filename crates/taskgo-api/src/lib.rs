//! # taskgo-api
//!
//! HTTP layer for TaskGo built on Axum.
//!
//! Provides the router, the per-client admission middleware, request logging,
//! CORS and compression layers, the JSON response envelope, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
