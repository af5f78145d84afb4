//! Concurrent directory of per-client token buckets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use taskgo_core::config::RateLimitConfig;
use taskgo_core::result::AppResult;

use crate::bucket::{BucketPolicy, TokenBucket};

/// A client's bucket plus the last time the client was seen.
#[derive(Debug)]
struct VisitorEntry {
    bucket: Arc<TokenBucket>,
    last_seen: Instant,
}

/// Maps client identities to their token buckets.
///
/// The map lock is held only for lookup, insertion and eviction. Callers get
/// an `Arc` to the bucket and consult it after the lock is released, so a
/// sweep that removes an entry never invalidates a bucket that is in use.
#[derive(Debug)]
pub struct VisitorRegistry {
    policy: BucketPolicy,
    visitors: Mutex<HashMap<String, VisitorEntry>>,
}

impl VisitorRegistry {
    /// Creates an empty registry whose buckets follow `policy`.
    pub fn new(policy: BucketPolicy) -> Self {
        Self {
            policy,
            visitors: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an empty registry from the rate limit configuration.
    pub fn from_config(config: &RateLimitConfig) -> AppResult<Self> {
        Ok(Self::new(BucketPolicy::from_config(config)?))
    }

    /// The policy applied to newly created buckets.
    pub fn policy(&self) -> BucketPolicy {
        self.policy
    }

    /// Returns the bucket for `identity`, creating a full one on first sight.
    pub fn get_or_create(&self, identity: &str) -> Arc<TokenBucket> {
        self.get_or_create_at(identity, Instant::now())
    }

    /// [`get_or_create`](Self::get_or_create) with an explicit clock reading.
    ///
    /// Bumps the identity's last-seen time on every call.
    pub fn get_or_create_at(&self, identity: &str, now: Instant) -> Arc<TokenBucket> {
        let mut visitors = self.lock();

        if let Some(entry) = visitors.get_mut(identity) {
            entry.last_seen = now;
            return Arc::clone(&entry.bucket);
        }

        let bucket = Arc::new(TokenBucket::new(self.policy, now));
        visitors.insert(
            identity.to_string(),
            VisitorEntry {
                bucket: Arc::clone(&bucket),
                last_seen: now,
            },
        );
        debug!(identity, visitors = visitors.len(), "New visitor registered");

        bucket
    }

    /// Looks up the identity's bucket and tries to consume one token.
    pub fn check(&self, identity: &str) -> bool {
        self.check_at(identity, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, identity: &str, now: Instant) -> bool {
        let bucket = self.get_or_create_at(identity, now);
        bucket.allow_at(now)
    }

    /// Removes every identity idle for longer than `ttl`.
    ///
    /// Returns the number of evicted entries.
    pub fn sweep(&self, ttl: Duration) -> usize {
        self.sweep_at(ttl, Instant::now())
    }

    /// [`sweep`](Self::sweep) with an explicit clock reading.
    pub fn sweep_at(&self, ttl: Duration, now: Instant) -> usize {
        let mut visitors = self.lock();
        let before = visitors.len();
        visitors.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        before - visitors.len()
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no identities are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `identity` currently has an entry.
    pub fn contains(&self, identity: &str) -> bool {
        self.lock().contains_key(identity)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VisitorEntry>> {
        self.visitors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
