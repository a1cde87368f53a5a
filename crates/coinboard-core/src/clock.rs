//! Time source injected into the rate limiter, retry loop, cache and facade.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::UtcDateTime;

/// Monotonic and wall-clock time plus the ability to wait.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for rate-limit spacing and TTL checks.
    fn now(&self) -> Instant;

    /// Wall-clock time used for timestamps in normalized records.
    fn wall_now(&self) -> UtcDateTime;

    /// Suspends the calling task for `duration`.
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Real time backed by `std::time` and the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Virtual clock for deterministic tests.
///
/// Time only moves when [`ManualClock::advance`] or [`Clock::sleep`] is called;
/// `sleep` completes immediately after advancing.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: UtcDateTime,
    inner: Mutex<ManualInner>,
}

#[derive(Debug, Default)]
struct ManualInner {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(UtcDateTime::now())
    }

    pub fn starting_at(wall_origin: UtcDateTime) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin,
            inner: Mutex::new(ManualInner::default()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut inner = self.inner.lock().expect("manual clock lock is not poisoned");
        inner.elapsed += duration;
    }

    pub fn elapsed(&self) -> Duration {
        self.inner
            .lock()
            .expect("manual clock lock is not poisoned")
            .elapsed
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.inner
            .lock()
            .expect("manual clock lock is not poisoned")
            .sleeps
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall_now(&self) -> UtcDateTime {
        self.wall_origin.saturating_add(self.elapsed())
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        {
            let mut inner = self.inner.lock().expect("manual clock lock is not poisoned");
            inner.elapsed += duration;
            inner.sleeps.push(duration);
        }
        Box::pin(tokio::task::yield_now())
    }
}
