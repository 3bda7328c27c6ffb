//! Retry wrapper for every remote store call.
//!
//! Rate-limit errors are retried forever under [`BackoffPolicy`]; transient
//! errors a bounded number of times; everything else goes straight back to
//! the caller. The rate-limit floor is shared by every call in the process
//! and only ratchets upward.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use roster_domain::{BackoffPolicy, ErrorClass, RetryAction, StoreError};

use crate::{Metrics, ShutdownSignal};

pub struct RetryingInvoker {
    policy: BackoffPolicy,
    floor_ms: AtomicU64,
    shutdown: ShutdownSignal,
    metrics: Arc<Metrics>,
}

impl RetryingInvoker {
    pub fn new(policy: BackoffPolicy, shutdown: ShutdownSignal, metrics: Arc<Metrics>) -> Self {
        let floor_ms = AtomicU64::new(policy.initial_delay_ms);
        Self {
            policy,
            floor_ms,
            shutdown,
            metrics,
        }
    }

    /// Current process-wide rate-limit floor.
    pub fn floor(&self) -> Duration {
        Duration::from_millis(self.floor_ms.load(Ordering::Acquire))
    }

    pub async fn invoke<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        // Retry counts are kept per error class.
        let mut rate_limit_attempts: u32 = 0;
        let mut transient_attempts: u32 = 0;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let class = err.class();
            let attempt = match class {
                ErrorClass::RateLimited => rate_limit_attempts,
                ErrorClass::Transient => transient_attempts,
                _ => 0,
            };
            let (action, next_floor) = self.policy.decide(class, attempt, self.floor());
            let (delay, jitter_max, cooldown) = match action {
                RetryAction::Fail => {
                    debug!(operation = label, attempt, error = %err, "remote call failed");
                    return Err(err);
                }
                RetryAction::Wait {
                    delay,
                    jitter_max,
                    cooldown,
                } => (delay, jitter_max, cooldown),
            };

            if class == ErrorClass::RateLimited {
                self.raise_floor(next_floor);
                self.metrics.record_rate_limit(cooldown);
            }
            let wait = delay + jitter(jitter_max);
            if cooldown {
                warn!(
                    operation = label,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "rate limit persists, cooling down"
                );
            } else {
                warn!(
                    operation = label,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "remote call failed, retrying"
                );
            }

            self.sleep(wait).await?;
            match class {
                ErrorClass::RateLimited => rate_limit_attempts = rate_limit_attempts.saturating_add(1),
                ErrorClass::Transient => transient_attempts = transient_attempts.saturating_add(1),
                _ => {}
            }
        }
    }

    fn raise_floor(&self, next: Duration) {
        let next_ms = u64::try_from(next.as_millis()).unwrap_or(u64::MAX);
        self.floor_ms.fetch_max(next_ms, Ordering::AcqRel);
    }

    async fn sleep(&self, wait: Duration) -> Result<(), StoreError> {
        if self.shutdown.is_triggered() {
            return Err(StoreError::Cancelled);
        }
        tokio::select! {
            _ = tokio::time::sleep(wait) => Ok(()),
            _ = self.shutdown.cancelled() => Err(StoreError::Cancelled),
        }
    }
}

// ThreadRng is not Send, so it never lives across an await point.
fn jitter(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}
