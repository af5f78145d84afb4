//! # taskgo-limiter
//!
//! In-process admission control keyed by client identity.
//!
//! - [`TokenBucket`]: lazily refilled bucket deciding admit/deny for one client
//! - [`VisitorRegistry`]: concurrent identity → bucket directory
//! - [`Reclaimer`]: background task evicting idle identities
//!
//! All timestamps are [`tokio::time::Instant`], so paused runtime time in
//! tests drives refill and eviction deterministically.

pub mod bucket;
pub mod reclaimer;
pub mod registry;

pub use bucket::{BucketPolicy, TokenBucket};
pub use reclaimer::Reclaimer;
pub use registry::VisitorRegistry;
