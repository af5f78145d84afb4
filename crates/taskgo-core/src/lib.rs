//! # taskgo-core
//!
//! Core crate for TaskGo. Contains configuration schemas and the unified
//! error system shared by the limiter and the HTTP layer.
//!
//! This crate has **no** internal dependencies on other TaskGo crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
