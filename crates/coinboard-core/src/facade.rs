//! Public entry point: cache lookup, then rate-limited fetch, transform and store.
//!
//! ```rust,ignore
//! use coinboard_core::{DashboardConfig, LogicalQuery, QueryFacade, QueryResponse};
//!
//! let facade = QueryFacade::from_config(DashboardConfig::builder().from_env().build());
//! match facade.query(&LogicalQuery::listing(10)?).await {
//!     QueryResponse::Fresh { data, .. } => println!("{:?}", data.as_listing()),
//!     QueryResponse::Degraded { reason, .. } => eprintln!("degraded: {reason}"),
//!     QueryResponse::Fetching => println!("already loading"),
//!     QueryResponse::Error { error } => eprintln!("{error}"),
//! }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::ResponseCache;
use crate::clock::{Clock, SystemClock};
use crate::config::DashboardConfig;
use crate::fetcher::RetryingFetcher;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider_policy::HostPolicy;
use crate::query::{CacheKey, Category, LogicalQuery};
use crate::throttling::RateLimiter;
use crate::transform::{self, news};
use crate::upstream;
use crate::{FetchError, NormalizedRecord};

/// Outcome of one [`QueryFacade::query`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResponse {
    /// Upstream or unexpired cached data.
    Fresh {
        data: NormalizedRecord,
        cache_hit: bool,
    },
    /// Placeholder data standing in for an unavailable upstream. Never cached.
    Degraded {
        data: NormalizedRecord,
        reason: String,
    },
    /// An identical query is already in flight; its result will land in the cache.
    Fetching,
    /// The retry budget was exhausted or the failure was not transient. Never cached.
    Error { error: FetchError },
}

impl QueryResponse {
    pub const fn data(&self) -> Option<&NormalizedRecord> {
        match self {
            Self::Fresh { data, .. } | Self::Degraded { data, .. } => Some(data),
            Self::Fetching | Self::Error { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<NormalizedRecord> {
        match self {
            Self::Fresh { data, .. } | Self::Degraded { data, .. } => Some(data),
            Self::Fetching | Self::Error { .. } => None,
        }
    }

    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    pub const fn status_label(&self) -> &'static str {
        match self {
            Self::Fresh { .. } => "fresh",
            Self::Degraded { .. } => "degraded",
            Self::Fetching => "fetching",
            Self::Error { .. } => "error",
        }
    }
}

/// Point-in-time view of a query without triggering a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// An unexpired entry is cached.
    Cached,
    Fetching,
    /// Nothing cached and nothing in flight.
    Idle,
}

/// Cloneable handle over one shared cache, rate limiter and fetcher.
#[derive(Clone)]
pub struct QueryFacade {
    inner: Arc<FacadeInner>,
}

struct FacadeInner {
    config: DashboardConfig,
    cache: ResponseCache,
    fetcher: RetryingFetcher,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<HashSet<CacheKey>>,
}

impl QueryFacade {
    pub fn new(
        config: DashboardConfig,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut limiter = RateLimiter::new(Arc::clone(&clock), HostPolicy::default());
        for upstream in [&config.market, &config.news] {
            if let Some(host) = upstream.host() {
                limiter = limiter.with_host_policy(host, upstream.policy.clone());
            }
        }

        let fetcher = RetryingFetcher::new(
            http_client,
            Arc::new(limiter),
            config.retry.clone(),
            Arc::clone(&clock),
        );

        Self {
            inner: Arc::new(FacadeInner {
                cache: ResponseCache::new(Arc::clone(&clock)),
                config,
                fetcher,
                clock,
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Facade over the real network and system time.
    pub fn from_config(config: DashboardConfig) -> Self {
        Self::new(
            config,
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// Resolves `query` from the cache, or runs the fetch pipeline.
    ///
    /// The pipeline runs on its own task: if the caller stops awaiting, the
    /// fetch still completes and populates the cache.
    pub async fn query(&self, query: &LogicalQuery) -> QueryResponse {
        let key = query.cache_key();

        if let Some(entry) = self.inner.cache.get(query).await {
            debug!(%key, "cache hit");
            return QueryResponse::Fresh {
                data: entry.payload,
                cache_hit: true,
            };
        }

        let claimed = self
            .inner
            .in_flight
            .lock()
            .expect("in-flight set should not be poisoned")
            .insert(key.clone());
        if !claimed {
            debug!(%key, "query already in flight");
            return QueryResponse::Fetching;
        }
        debug!(%key, "cache miss");

        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
            key,
        };
        let query = query.clone();
        let task = tokio::spawn(async move {
            let response = guard.inner.run_pipeline(query).await;
            drop(guard);
            response
        });

        match task.await {
            Ok(response) => response,
            Err(join_error) => QueryResponse::Error {
                error: FetchError::Internal {
                    message: join_error.to_string(),
                },
            },
        }
    }

    pub async fn status(&self, query: &LogicalQuery) -> QueryStatus {
        if self.inner.cache.get(query).await.is_some() {
            return QueryStatus::Cached;
        }

        let in_flight = self
            .inner
            .in_flight
            .lock()
            .expect("in-flight set should not be poisoned")
            .contains(&query.cache_key());
        if in_flight {
            QueryStatus::Fetching
        } else {
            QueryStatus::Idle
        }
    }
}

impl std::fmt::Debug for QueryFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFacade")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl FacadeInner {
    async fn run_pipeline(&self, query: LogicalQuery) -> QueryResponse {
        let category = query.category();
        let request = upstream::request_for(&query, &self.config);
        let started = self.clock.now();

        let outcome = self.fetcher.fetch(&request).await;
        let attempts = outcome.attempts;

        let response = match outcome.result {
            Ok(response) => response,
            Err(error) if category == Category::News => {
                warn!(
                    %category,
                    attempts,
                    %error,
                    "news upstream unavailable, serving placeholders"
                );
                let feed = news::placeholder_feed(query.count(), self.clock.wall_now());
                return QueryResponse::Degraded {
                    data: NormalizedRecord::News(feed),
                    reason: error.to_string(),
                };
            }
            Err(error) => {
                warn!(%category, attempts, code = error.code(), %error, "query failed");
                return QueryResponse::Error { error };
            }
        };

        let record = transform::transform(&response.body, &query, self.clock.wall_now());
        if record.is_placeholder() {
            warn!(%category, attempts, "malformed news payload, serving placeholders");
            return QueryResponse::Degraded {
                data: record,
                reason: String::from("malformed upstream news payload"),
            };
        }

        let ttl = self.config.ttl.ttl_for(category);
        self.cache.put(query, record.clone(), ttl).await;

        info!(
            %category,
            attempts,
            elapsed_ms = self.clock.now().saturating_duration_since(started).as_millis() as u64,
            "query completed from upstream"
        );

        QueryResponse::Fresh {
            data: record,
            cache_hit: false,
        }
    }
}

/// Releases an in-flight claim when the pipeline task finishes or unwinds.
struct InFlightGuard {
    inner: Arc<FacadeInner>,
    key: CacheKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.inner.in_flight.lock() {
            in_flight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::http_client::{HttpResponse, ScriptedHttpClient};

    fn facade_with(client: Arc<ScriptedHttpClient>, clock: Arc<ManualClock>) -> QueryFacade {
        QueryFacade::new(DashboardConfig::default(), client, clock)
    }

    #[tokio::test]
    async fn second_query_is_served_from_cache() {
        let client = Arc::new(ScriptedHttpClient::always(r#"[{"id":"bitcoin"}]"#));
        let facade = facade_with(client.clone(), Arc::new(ManualClock::new()));
        let query = LogicalQuery::listing(10).expect("valid");

        let first = facade.query(&query).await;
        let second = facade.query(&query).await;

        assert!(matches!(first, QueryResponse::Fresh { cache_hit: false, .. }));
        assert!(matches!(second, QueryResponse::Fresh { cache_hit: true, .. }));
        assert_eq!(client.request_count(), 1);
        assert_eq!(facade.status(&query).await, QueryStatus::Cached);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let client = Arc::new(ScriptedHttpClient::always_status(503));
        let facade = facade_with(client.clone(), Arc::new(ManualClock::new()));
        let query = LogicalQuery::detail("bitcoin").expect("valid");

        let first = facade.query(&query).await;
        assert_eq!(
            first,
            QueryResponse::Error {
                error: FetchError::Upstream { status: 503 }
            }
        );
        assert_eq!(client.request_count(), 3);

        client.push(Ok(HttpResponse::ok_json(r#"{"id":"bitcoin"}"#)));
        let second = facade.query(&query).await;

        assert!(second.is_fresh());
        assert_eq!(client.request_count(), 4);
        assert_eq!(facade.status(&query).await, QueryStatus::Cached);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let client = Arc::new(ScriptedHttpClient::always("[]"));
        let clock = Arc::new(ManualClock::new());
        let facade = facade_with(client.clone(), clock.clone());
        let query = LogicalQuery::exchanges(5).expect("valid");

        facade.query(&query).await;
        clock.advance(Duration::from_secs(600));
        assert_eq!(facade.status(&query).await, QueryStatus::Idle);

        facade.query(&query).await;
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn news_outage_is_degraded_and_flagged() {
        let client = Arc::new(ScriptedHttpClient::always_status(500));
        let facade = facade_with(client.clone(), Arc::new(ManualClock::new()));
        let query = LogicalQuery::news("Bitcoin", 4).expect("valid");

        let response = facade.query(&query).await;

        match response {
            QueryResponse::Degraded { data, reason } => {
                assert!(data.is_placeholder());
                assert_eq!(data.as_news().map(|feed| feed.items.len()), Some(4));
                assert!(reason.contains("500"));
            }
            other => panic!("expected degraded response, got {other:?}"),
        }
        assert!(facade.cache().is_empty().await);
    }

    #[test]
    fn response_serializes_with_status_tag() {
        let value = serde_json::to_value(QueryResponse::Error {
            error: FetchError::RateLimitExceeded,
        })
        .expect("response serializes");

        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["kind"], "rate_limit_exceeded");
        assert_eq!(
            serde_json::to_value(QueryResponse::Fetching).expect("serializes")["status"],
            "fetching"
        );
    }
}
