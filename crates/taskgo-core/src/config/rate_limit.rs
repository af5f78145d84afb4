//! Per-client admission control configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Environment variable overriding [`RateLimitConfig::requests_per_second`].
pub const RATE_LIMIT_RPS_VAR: &str = "RATE_LIMIT_RPS";
/// Environment variable overriding [`RateLimitConfig::burst`].
pub const RATE_LIMIT_BURST_VAR: &str = "RATE_LIMIT_BURST";

/// Token-bucket admission settings applied to every client identity.
///
/// Rates are expressed in requests per second; the burst is the bucket
/// capacity a fresh client starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the admission middleware is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sustained admitted requests per second.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Maximum burst size (bucket capacity).
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Idle time after which a client's bucket is reclaimed.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: u64,
    /// Period between reclaimer sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            idle_ttl_seconds: default_idle_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl RateLimitConfig {
    /// Idle TTL as a [`Duration`].
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_seconds)
    }

    /// Sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Apply `RATE_LIMIT_RPS` / `RATE_LIMIT_BURST` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// Unparsable or non-positive values are ignored and the current value
    /// is kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rps) = positive_int(&lookup, RATE_LIMIT_RPS_VAR) {
            self.requests_per_second = rps;
        }
        if let Some(burst) = positive_int(&lookup, RATE_LIMIT_BURST_VAR) {
            self.burst = burst;
        }
    }

    /// Reject settings that would make the limiter meaningless.
    pub fn validate(&self) -> AppResult<()> {
        if self.requests_per_second == 0 {
            return Err(AppError::configuration(
                "rate_limit.requests_per_second must be greater than zero",
            ));
        }
        if self.burst == 0 {
            return Err(AppError::configuration(
                "rate_limit.burst must be greater than zero",
            ));
        }
        if self.idle_ttl_seconds == 0 {
            return Err(AppError::configuration(
                "rate_limit.idle_ttl_seconds must be greater than zero",
            ));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(AppError::configuration(
                "rate_limit.sweep_interval_seconds must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn positive_int<F>(lookup: &F, key: &str) -> Option<u32>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring invalid rate limit override");
            None
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_requests_per_second() -> u32 {
    60
}

fn default_burst() -> u32 {
    30
}

fn default_idle_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}
