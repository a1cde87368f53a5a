//! Per-host outbound call spacing.
//!
//! Every host keeps the instant of its most recent grant. A caller reserves the
//! next slot (`last grant + min interval`, or now if that has passed) under the
//! lock, then sleeps outside it, so concurrent callers for one host are spaced
//! one interval apart. Hosts with a quota additionally pass a `governor` check.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use governor::clock::Clock as GovernorClock;
use governor::middleware::NoOpMiddleware;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter as GovernorLimiter};
use tracing::debug;

use crate::clock::Clock;
use crate::provider_policy::{HostPolicy, QuotaPolicy};

type QuotaLimiter = GovernorLimiter<NotKeyed, InMemoryState, QuotaClock, NoOpMiddleware<Instant>>;

/// Feeds the injected [`Clock`] to `governor`, so quotas refill in the same
/// time base the spacing and sleeps use.
#[derive(Clone)]
struct QuotaClock(Arc<dyn Clock>);

impl GovernorClock for QuotaClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        self.0.now()
    }
}

pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    default_policy: HostPolicy,
    policies: HashMap<String, HostPolicy>,
    quotas: HashMap<String, Arc<QuotaLimiter>>,
    last_granted: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, default_policy: HostPolicy) -> Self {
        Self {
            clock,
            default_policy,
            policies: HashMap::new(),
            quotas: HashMap::new(),
            last_granted: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_host_policy(mut self, host: impl Into<String>, policy: HostPolicy) -> Self {
        let host = host.into();
        match policy.quota {
            Some(quota) => {
                let clock = QuotaClock(Arc::clone(&self.clock));
                let limiter = GovernorLimiter::direct_with_clock(governor_quota(quota), &clock);
                self.quotas.insert(host.clone(), Arc::new(limiter));
            }
            None => {
                self.quotas.remove(&host);
            }
        }
        self.policies.insert(host, policy);
        self
    }

    pub fn policy_for(&self, host: &str) -> &HostPolicy {
        self.policies.get(host).unwrap_or(&self.default_policy)
    }

    /// Waits until `host` may be called again and records the grant.
    ///
    /// The quota is settled first; only then is a spacing slot reserved, so a
    /// caller held back by the quota never pushes later callers further out.
    /// Returns the instant of the grant.
    pub async fn acquire(&self, host: &str) -> Instant {
        while let Err(retry_after) = self.check_quota(host) {
            debug!(
                host,
                wait_ms = retry_after.as_millis() as u64,
                "host quota exhausted"
            );
            self.clock.sleep(retry_after).await;
        }

        let (slot, wait) = self.reserve(host);
        if !wait.is_zero() {
            debug!(host, wait_ms = wait.as_millis() as u64, "rate limiter delaying call");
            self.clock.sleep(wait).await;
        }
        slot
    }

    pub fn last_granted_at(&self, host: &str) -> Option<Instant> {
        self.last_granted
            .lock()
            .expect("rate limiter state should not be poisoned")
            .get(host)
            .copied()
    }

    fn reserve(&self, host: &str) -> (Instant, Duration) {
        let min_interval = self.policy_for(host).min_interval;
        let now = self.clock.now();

        let mut last_granted = self
            .last_granted
            .lock()
            .expect("rate limiter state should not be poisoned");
        let slot = match last_granted.get(host) {
            Some(last) => (*last + min_interval).max(now),
            None => now,
        };
        last_granted.insert(host.to_owned(), slot);

        (slot, slot.saturating_duration_since(now))
    }

    fn check_quota(&self, host: &str) -> Result<(), Duration> {
        let Some(limiter) = self.quotas.get(host) else {
            return Ok(());
        };

        limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

fn governor_quota(quota: QuotaPolicy) -> Quota {
    let safe_limit = quota.limit.max(1);
    let burst = NonZeroU32::new(safe_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota.window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
