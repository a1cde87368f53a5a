//! Static configuration for the query pipeline.
//!
//! # Environment Variables
//!
//! | Setting | Primary Env Var | Fallback Env Var |
//! |---------|-----------------|------------------|
//! | CoinGecko API key | `COINBOARD_COINGECKO_API_KEY` | `COINGECKO_API_KEY` |
//! | CoinGecko base URL | `COINBOARD_COINGECKO_BASE_URL` | - |
//! | CryptoCompare base URL | `COINBOARD_CRYPTOCOMPARE_BASE_URL` | - |
//! | Retry budget | `COINBOARD_MAX_RETRIES` | - |
//!
//! Environment values are read once by [`DashboardConfigBuilder::from_env`];
//! the built [`DashboardConfig`] never changes afterwards.

use std::env;
use std::time::Duration;

use crate::http_client::HttpAuth;
use crate::provider_policy::HostPolicy;
use crate::query::Category;
use crate::retry::RetryConfig;
use crate::ProviderId;

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const CRYPTOCOMPARE_BASE_URL: &str = "https://min-api.cryptocompare.com/data/v2";
pub const COINGECKO_API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// One upstream provider: where it lives, how fast it may be called, how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub provider: ProviderId,
    pub base_url: String,
    pub policy: HostPolicy,
    pub auth: HttpAuth,
}

impl UpstreamConfig {
    pub fn default_for(provider: ProviderId) -> Self {
        let base_url = match provider {
            ProviderId::CoinGecko => COINGECKO_BASE_URL,
            ProviderId::CryptoCompare => CRYPTOCOMPARE_BASE_URL,
        };
        Self {
            provider,
            base_url: base_url.to_owned(),
            policy: HostPolicy::default_for(provider),
            auth: HttpAuth::None,
        }
    }

    /// Host of `base_url`, the key used by the rate limiter.
    pub fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
    }

    /// `base_url` joined with `path`, without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Cache lifetime per query category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub listing: Duration,
    pub detail: Duration,
    pub history: Duration,
    pub exchanges: Duration,
    pub news: Duration,
}

impl TtlPolicy {
    pub const fn ttl_for(&self, category: Category) -> Duration {
        match category {
            Category::Listing => self.listing,
            Category::Detail => self.detail,
            Category::History => self.history,
            Category::Exchanges => self.exchanges,
            Category::News => self.news,
        }
    }

    /// Every category uses `ttl`; zero disables caching.
    pub const fn uniform(ttl: Duration) -> Self {
        Self {
            listing: ttl,
            detail: ttl,
            history: ttl,
            exchanges: ttl,
            news: ttl,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            listing: Duration::from_secs(60),
            detail: Duration::from_secs(60),
            history: Duration::from_secs(300),
            exchanges: Duration::from_secs(600),
            news: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub market: UpstreamConfig,
    pub news: UpstreamConfig,
    pub ttl: TtlPolicy,
    pub retry: RetryConfig,
    /// Per-request transport timeout.
    pub timeout_ms: u64,
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::new()
    }

    pub fn upstream(&self, provider: ProviderId) -> &UpstreamConfig {
        match provider {
            ProviderId::CoinGecko => &self.market,
            ProviderId::CryptoCompare => &self.news,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfigBuilder::new().build()
    }
}

/// Builder for [`DashboardConfig`].
///
/// ```rust,ignore
/// use coinboard_core::DashboardConfig;
///
/// let config = DashboardConfig::builder()
///     .from_env()
///     .with_max_retries(3)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct DashboardConfigBuilder {
    market: UpstreamConfig,
    news: UpstreamConfig,
    ttl: TtlPolicy,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl DashboardConfigBuilder {
    pub fn new() -> Self {
        Self {
            market: UpstreamConfig::default_for(ProviderId::CoinGecko),
            news: UpstreamConfig::default_for(ProviderId::CryptoCompare),
            ttl: TtlPolicy::default(),
            retry: RetryConfig::default(),
            timeout_ms: 10_000,
        }
    }

    /// Applies overrides from the process environment.
    ///
    /// Unparseable numeric values are ignored.
    pub fn from_env(self) -> Self {
        self.from_lookup(|name| env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) =
            non_empty("COINBOARD_COINGECKO_API_KEY").or_else(|| non_empty("COINGECKO_API_KEY"))
        {
            self = self.with_coingecko_key(key);
        }
        if let Some(url) = non_empty("COINBOARD_COINGECKO_BASE_URL") {
            self.market.base_url = url;
        }
        if let Some(url) = non_empty("COINBOARD_CRYPTOCOMPARE_BASE_URL") {
            self.news.base_url = url;
        }
        if let Some(max_retries) =
            non_empty("COINBOARD_MAX_RETRIES").and_then(|raw| raw.trim().parse::<u32>().ok())
        {
            self.retry.max_retries = max_retries;
        }
        self
    }

    pub fn with_coingecko_key(mut self, key: impl Into<String>) -> Self {
        self.market.auth = HttpAuth::Header {
            name: String::from(COINGECKO_API_KEY_HEADER),
            value: key.into(),
        };
        self
    }

    pub fn with_market_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.market.base_url = base_url.into();
        self
    }

    pub fn with_news_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.news.base_url = base_url.into();
        self
    }

    pub fn with_host_policy(mut self, provider: ProviderId, policy: HostPolicy) -> Self {
        match provider {
            ProviderId::CoinGecko => self.market.policy = policy,
            ProviderId::CryptoCompare => self.news.policy = policy,
        }
        self
    }

    pub fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> DashboardConfig {
        DashboardConfig {
            market: self.market,
            news: self.news,
            ttl: self.ttl,
            retry: self.retry,
            timeout_ms: self.timeout_ms,
        }
    }
}

impl Default for DashboardConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DashboardConfig::default();

        assert_eq!(config.market.base_url, COINGECKO_BASE_URL);
        assert_eq!(config.news.base_url, CRYPTOCOMPARE_BASE_URL);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.ttl.ttl_for(Category::News), Duration::from_secs(300));
        assert_eq!(config.ttl.ttl_for(Category::Exchanges), Duration::from_secs(600));
        assert_eq!(config.market.auth, HttpAuth::None);
        assert_eq!(config.market.host().as_deref(), Some("api.coingecko.com"));
        assert_eq!(
            config.news.host().as_deref(),
            Some("min-api.cryptocompare.com")
        );
    }

    #[test]
    fn env_key_falls_back_to_unprefixed_name() {
        let config = DashboardConfigBuilder::new()
            .from_lookup(lookup_from(&[("COINGECKO_API_KEY", "fallback-key")]))
            .build();

        assert_eq!(
            config.market.auth,
            HttpAuth::Header {
                name: String::from("x-cg-demo-api-key"),
                value: String::from("fallback-key"),
            }
        );
    }

    #[test]
    fn prefixed_env_values_win_and_bad_numbers_are_ignored() {
        let config = DashboardConfigBuilder::new()
            .from_lookup(lookup_from(&[
                ("COINBOARD_COINGECKO_API_KEY", "primary"),
                ("COINGECKO_API_KEY", "fallback"),
                ("COINBOARD_COINGECKO_BASE_URL", "http://127.0.0.1:9000/api/v3/"),
                ("COINBOARD_MAX_RETRIES", "many"),
            ]))
            .build();

        assert!(matches!(
            &config.market.auth,
            HttpAuth::Header { value, .. } if value == "primary"
        ));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(
            config.market.endpoint("/coins/markets"),
            "http://127.0.0.1:9000/api/v3/coins/markets"
        );
    }

    #[test]
    fn max_retries_override_parses() {
        let config = DashboardConfigBuilder::new()
            .from_lookup(lookup_from(&[("COINBOARD_MAX_RETRIES", " 4 ")]))
            .build();

        assert_eq!(config.retry.max_retries, 4);
    }
}
