//! # Coinboard Core
//!
//! Data layer for the coinboard crypto dashboard: rate-limited, retried,
//! cached queries against public market-data and news APIs, normalized into
//! one set of record shapes.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Response cache with lazy TTL expiry |
//! | [`clock`] | Injectable time source (system and manual) |
//! | [`config`] | Upstreams, TTLs, retry budget, env overrides |
//! | [`domain`] | Normalized records (coins, history, exchanges, news) |
//! | [`error`] | Validation and fetch errors |
//! | [`facade`] | `QueryFacade`, the public entry point |
//! | [`fetcher`] | Rate-limited fetch with bounded retry |
//! | [`http_client`] | HTTP transport seam (reqwest and scripted) |
//! | [`provider_policy`] | Per-host call spacing and quotas |
//! | [`query`] | Logical queries and canonical cache keys |
//! | [`retry`] | Retry classification and the `with_retry` combinator |
//! | [`source`] | Upstream provider identifiers |
//! | [`throttling`] | Per-host rate limiter |
//! | [`transform`] | Raw upstream documents to normalized records |
//! | [`upstream`] | Raw upstream shapes and request builders |
//!
//! ## Pipeline
//!
//! ```text
//! LogicalQuery ─▶ ResponseCache ──hit──▶ Fresh
//!                      │ miss
//!                      ▼
//!                 RateLimiter ─▶ RetryingFetcher ─▶ transform ─▶ ResponseCache ─▶ Fresh
//!                                      │ exhausted
//!                                      ▼
//!                                Error (news: Degraded placeholders)
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod facade;
pub mod fetcher;
pub mod http_client;
pub mod provider_policy;
pub mod query;
pub mod retry;
pub mod source;
pub mod throttling;
pub mod transform;
pub mod upstream;

// Caching
pub use cache::{CacheEntry, ResponseCache};

// Time
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration
pub use config::{DashboardConfig, DashboardConfigBuilder, TtlPolicy, UpstreamConfig};

// Domain models
pub use domain::{
    available_periods, default_period, CoinDetail, CoinLink, CoinSummary, ExchangeSummary,
    GlobalStats, NewsFeed, NewsItem, NormalizedRecord, PriceHistory, PricePoint, TimePeriod,
    UtcDateTime,
};

// Error types
pub use error::{CoreError, FetchError, ValidationError};

// Entry point
pub use facade::{QueryFacade, QueryResponse, QueryStatus};

pub use fetcher::RetryingFetcher;

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

pub use provider_policy::{HostPolicy, QuotaPolicy};

pub use query::{CacheKey, Category, LogicalQuery};

// Retry logic
pub use retry::{with_retry, Backoff, RetryConfig, RetryOutcome};

pub use source::ProviderId;

pub use throttling::RateLimiter;
