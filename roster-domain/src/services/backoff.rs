//! Adaptive backoff for remote store calls.
//!
//! The policy is a pure function from (error class, retries so far, current
//! floor) to (action, new floor). The floor is process-wide and only ever
//! ratchets upward; the invoker owns it and performs the actual sleeps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorClass;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub cooldown_threshold_ms: u64,
    pub cooldown_delay_ms: u64,
    pub max_fast_retries: u32,
    pub fast_jitter_ms: u64,
    pub cooldown_jitter_ms: u64,
    pub transient_retry_limit: u32,
    pub transient_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 90_000,
            cooldown_threshold_ms: 30_000,
            cooldown_delay_ms: 60_000,
            max_fast_retries: 3,
            fast_jitter_ms: 400,
            cooldown_jitter_ms: 3_000,
            transient_retry_limit: 3,
            transient_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Sleep `delay` plus a random jitter in `[0, jitter_max]`, then retry.
    Wait {
        delay: Duration,
        jitter_max: Duration,
        cooldown: bool,
    },
    /// Surface the error to the caller.
    Fail,
}

impl BackoffPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// `attempt` is the number of retries this call has already made for
    /// errors of the same class.
    pub fn decide(&self, class: ErrorClass, attempt: u32, floor: Duration) -> (RetryAction, Duration) {
        match class {
            ErrorClass::RateLimited => self.on_rate_limit(attempt, floor),
            ErrorClass::Transient if attempt < self.transient_retry_limit => {
                let delay = Duration::from_millis(self.transient_delay_ms * u64::from(attempt + 1));
                (
                    RetryAction::Wait {
                        delay,
                        jitter_max: Duration::ZERO,
                        cooldown: false,
                    },
                    floor,
                )
            }
            _ => (RetryAction::Fail, floor),
        }
    }

    fn on_rate_limit(&self, attempt: u32, floor: Duration) -> (RetryAction, Duration) {
        let threshold = Duration::from_millis(self.cooldown_threshold_ms);
        let cooldown = Duration::from_millis(self.cooldown_delay_ms);
        if floor >= threshold || attempt > self.max_fast_retries {
            return (
                RetryAction::Wait {
                    delay: cooldown,
                    jitter_max: Duration::from_millis(self.cooldown_jitter_ms),
                    cooldown: true,
                },
                floor.max(cooldown),
            );
        }
        let ceiling = Duration::from_millis(self.max_delay_ms);
        let next = floor.saturating_mul(2).min(ceiling).max(floor);
        (
            RetryAction::Wait {
                delay: floor,
                jitter_max: Duration::from_millis(self.fast_jitter_ms),
                cooldown: false,
            },
            next,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_delay(action: RetryAction) -> Duration {
        match action {
            RetryAction::Wait { delay, .. } => delay,
            RetryAction::Fail => panic!("expected wait"),
        }
    }

    #[test]
    fn rate_limit_delays_never_decrease_until_cooldown() {
        let policy = BackoffPolicy::default();
        let mut floor = policy.initial_delay();
        let mut delays = Vec::new();
        for attempt in 0..8 {
            let (action, next) = policy.decide(ErrorClass::RateLimited, attempt, floor);
            assert!(next >= floor, "floor shrank at attempt {attempt}");
            delays.push(wait_delay(action));
            floor = next;
        }
        assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[3], Duration::from_secs(8));
        assert_eq!(delays[4], Duration::from_secs(60));
        assert_eq!(floor, Duration::from_secs(60));
    }

    #[test]
    fn high_floor_goes_straight_to_cooldown() {
        let policy = BackoffPolicy::default();
        let (action, next) =
            policy.decide(ErrorClass::RateLimited, 0, Duration::from_secs(32));
        match action {
            RetryAction::Wait {
                delay,
                jitter_max,
                cooldown,
            } => {
                assert!(cooldown);
                assert_eq!(delay, Duration::from_secs(60));
                assert_eq!(jitter_max, Duration::from_secs(3));
            }
            RetryAction::Fail => panic!("rate limits are never fatal"),
        }
        assert_eq!(next, Duration::from_secs(60));
    }

    #[test]
    fn floor_is_capped_at_max_delay() {
        let policy = BackoffPolicy {
            cooldown_threshold_ms: 500_000,
            max_fast_retries: 100,
            ..BackoffPolicy::default()
        };
        let (_, next) = policy.decide(ErrorClass::RateLimited, 0, Duration::from_secs(80));
        assert_eq!(next, Duration::from_secs(90));
        let (_, next) = policy.decide(ErrorClass::RateLimited, 0, Duration::from_secs(95));
        assert_eq!(next, Duration::from_secs(95));
    }

    #[test]
    fn transient_errors_retry_a_bounded_number_of_times() {
        let policy = BackoffPolicy::default();
        let floor = Duration::from_secs(4);
        for attempt in 0..policy.transient_retry_limit {
            let (action, next) = policy.decide(ErrorClass::Transient, attempt, floor);
            assert!(matches!(action, RetryAction::Wait { cooldown: false, .. }));
            assert_eq!(next, floor);
        }
        let (action, _) = policy.decide(ErrorClass::Transient, policy.transient_retry_limit, floor);
        assert_eq!(action, RetryAction::Fail);
    }

    #[test]
    fn rejected_and_cancelled_fail_immediately() {
        let policy = BackoffPolicy::default();
        let floor = Duration::from_secs(1);
        assert_eq!(policy.decide(ErrorClass::Rejected, 0, floor).0, RetryAction::Fail);
        assert_eq!(policy.decide(ErrorClass::Cancelled, 0, floor).0, RetryAction::Fail);
    }
}
