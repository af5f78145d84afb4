//! Token bucket for a single client.

use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;

use taskgo_core::config::RateLimitConfig;
use taskgo_core::error::AppError;
use taskgo_core::result::AppResult;

/// Capacity and refill rate shared by every bucket a registry creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketPolicy {
    capacity: u32,
    refill_per_second: f64,
}

impl BucketPolicy {
    /// Creates a policy, rejecting a zero capacity or a non-positive rate.
    pub fn new(capacity: u32, refill_per_second: f64) -> AppResult<Self> {
        if capacity == 0 {
            return Err(AppError::configuration(
                "Bucket capacity must be at least 1",
            ));
        }
        if !refill_per_second.is_finite() || refill_per_second <= 0.0 {
            return Err(AppError::configuration(format!(
                "Bucket refill rate must be positive, got {refill_per_second}"
            )));
        }
        Ok(Self {
            capacity,
            refill_per_second,
        })
    }

    /// Builds the policy from `burst` and `requests_per_second`.
    pub fn from_config(config: &RateLimitConfig) -> AppResult<Self> {
        Self::new(config.burst, f64::from(config.requests_per_second))
    }

    /// Maximum burst size.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Sustained tokens added per second.
    pub fn refill_per_second(&self) -> f64 {
        self.refill_per_second
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Lazily refilled token bucket.
///
/// Tokens are recomputed from elapsed time whenever the bucket is consulted;
/// nothing ticks in the background. The state has its own lock so buckets of
/// different clients never contend with each other.
#[derive(Debug)]
pub struct TokenBucket {
    policy: BucketPolicy,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a full bucket whose refill clock starts at `now`.
    pub fn new(policy: BucketPolicy, now: Instant) -> Self {
        Self {
            policy,
            state: Mutex::new(BucketState {
                tokens: f64::from(policy.capacity),
                last_refill: now,
            }),
        }
    }

    /// The policy this bucket was created with.
    pub fn policy(&self) -> BucketPolicy {
        self.policy
    }

    /// Consumes one token if available, using the runtime clock.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Consumes one token if available at `now`.
    ///
    /// A denied call leaves the (refilled) token count untouched.
    pub fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state, now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens available at `now`, without consuming any.
    pub fn available_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state, now);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.policy.refill_per_second)
            .min(f64::from(self.policy.capacity));
        // A clock reading older than the last refill must not rewind it.
        if now > state.last_refill {
            state.last_refill = now;
        }
    }
}
