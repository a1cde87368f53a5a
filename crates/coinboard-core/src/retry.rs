//! Bounded retry of transient upstream failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::clock::Clock;
use crate::FetchError;

/// Backoff strategy between retries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Backoff {
    /// Retry immediately; spacing comes from the rate limiter alone.
    #[default]
    None,
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Configuration for the automatic retry mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism.
    pub enabled: bool,
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    /// Whether any 5xx response is retried. `429` is always retried; other
    /// 4xx never are.
    pub retry_on_server_error: bool,
    /// Whether retryable transport failures are retried.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            backoff: Backoff::None,
            retry_on_server_error: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(200),
                factor: 2.0,
                max: Duration::from_secs(3),
                jitter: true,
            },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        match status {
            429 => true,
            500..=599 => self.retry_on_server_error,
            _ => false,
        }
    }

    /// Whether `error` is transient under this configuration.
    pub fn is_transient(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Network { retryable, .. } => self.retry_on_network && *retryable,
            FetchError::Upstream { status } => self.should_retry_status(*status),
            FetchError::RateLimitExceeded => true,
            FetchError::MalformedResponse { .. } | FetchError::Internal { .. } => false,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Final result of a retried operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T> {
    pub result: Result<T, FetchError>,
    /// Attempts made, including the first.
    pub attempts: u32,
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RetryOutcome<U> {
        RetryOutcome {
            result: self.result.map(f),
            attempts: self.attempts,
        }
    }
}

/// Runs `operation` until it succeeds, fails non-transiently, or exhausts
/// `config.max_retries` additional attempts. The operation receives the
/// 0-based attempt index.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    clock: &dyn Clock,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let budget = if config.enabled { config.max_retries } else { 0 };
    let mut attempt = 0_u32;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                }
            }
            Err(error) if attempt < budget && config.is_transient(&error) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = budget + 1,
                    code = error.code(),
                    %error,
                    "transient upstream failure, retrying"
                );
                let delay = config.delay_for_attempt(attempt);
                if !delay.is_zero() {
                    clock.sleep(delay).await;
                }
                attempt += 1;
            }
            Err(error) => {
                return RetryOutcome {
                    result: Err(error),
                    attempts: attempt + 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(10), Duration::from_millis(100));
        assert_eq!(Backoff::None.delay(3), Duration::ZERO);
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn test_default_retry_config_classifies_errors() {
        let config = RetryConfig::default();

        assert_eq!(config.max_retries, 2);
        assert!(config.is_transient(&FetchError::RateLimitExceeded));
        assert!(config.is_transient(&FetchError::Upstream { status: 503 }));
        assert!(config.is_transient(&FetchError::network("reset")));
        assert!(!config.is_transient(&FetchError::Upstream { status: 404 }));
        assert!(!config.is_transient(&FetchError::Upstream { status: 400 }));
        assert!(!config.is_transient(&FetchError::Upstream { status: 408 }));
        assert!(config.is_transient(&FetchError::Upstream { status: 501 }));
        assert!(config.is_transient(&FetchError::Upstream { status: 507 }));
        assert!(config.should_retry_status(429));
        assert!(!config.is_transient(&FetchError::Network {
            message: String::from("bad url"),
            retryable: false,
        }));
    }

    #[tokio::test]
    async fn succeeds_after_two_transient_failures() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);

        let outcome = with_retry(&RetryConfig::with_max_retries(2), &clock, |_| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(FetchError::Upstream { status: 502 })
                } else {
                    Ok("payload")
                }
            }
        })
        .await;

        assert_eq!(outcome.result, Ok("payload"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget_with_last_error() {
        let clock = ManualClock::new();
        let calls = AtomicU32::new(0);

        let config = RetryConfig::with_max_retries(2);
        let outcome: RetryOutcome<()> = with_retry(&config, &clock, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(FetchError::network(format!("attempt {attempt} reset"))) }
        })
        .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result, Err(FetchError::network("attempt 2 reset")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let clock = ManualClock::new();

        let config = RetryConfig::with_max_retries(5);
        let outcome: RetryOutcome<()> = with_retry(&config, &clock, |_| async {
            Err(FetchError::Upstream { status: 404 })
        })
        .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result, Err(FetchError::Upstream { status: 404 }));
    }

    #[tokio::test]
    async fn disabled_retry_makes_a_single_attempt() {
        let clock = ManualClock::new();

        let outcome: RetryOutcome<()> = with_retry(&RetryConfig::no_retry(), &clock, |_| async {
            Err(FetchError::RateLimitExceeded)
        })
        .await;

        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn fixed_backoff_sleeps_between_attempts() {
        let clock = ManualClock::new();
        let config = RetryConfig {
            backoff: Backoff::Fixed {
                delay: Duration::from_millis(300),
            },
            ..RetryConfig::with_max_retries(2)
        };

        let _: RetryOutcome<()> = with_retry(&config, &clock, |_| async {
            Err(FetchError::Upstream { status: 500 })
        })
        .await;

        assert_eq!(
            clock.recorded_sleeps(),
            vec![Duration::from_millis(300), Duration::from_millis(300)]
        );
    }
}
