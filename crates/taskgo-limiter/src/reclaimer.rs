//! Background eviction of idle visitors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use taskgo_core::config::RateLimitConfig;

use crate::registry::VisitorRegistry;

/// Periodically sweeps a [`VisitorRegistry`] until told to stop.
#[derive(Debug, Clone)]
pub struct Reclaimer {
    registry: Arc<VisitorRegistry>,
    idle_ttl: Duration,
    sweep_interval: Duration,
}

impl Reclaimer {
    /// Creates a reclaimer for `registry`.
    pub fn new(
        registry: Arc<VisitorRegistry>,
        idle_ttl: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            registry,
            idle_ttl,
            sweep_interval,
        }
    }

    /// Creates a reclaimer using the configured TTL and interval.
    pub fn from_config(registry: Arc<VisitorRegistry>, config: &RateLimitConfig) -> Self {
        Self::new(registry, config.idle_ttl(), config.sweep_interval())
    }

    /// Runs on the current runtime until the shutdown flag is set.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Sweeps once per interval until the shutdown flag flips to `true` or
    /// the sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            idle_ttl_secs = self.idle_ttl.as_secs(),
            sweep_interval_secs = self.sweep_interval.as_secs(),
            "Visitor reclaimer started"
        );

        let mut ticker = time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep_once();
                }
            }
        }

        info!("Visitor reclaimer stopped");
    }

    /// Performs a single sweep and returns the number of evicted identities.
    pub fn sweep_once(&self) -> usize {
        let evicted = self.registry.sweep(self.idle_ttl);
        if evicted > 0 {
            info!(
                evicted,
                remaining = self.registry.len(),
                "Evicted idle visitors"
            );
        } else {
            debug!("Visitor sweep found nothing to evict");
        }
        evicted
    }
}
