//! CoinGecko v3 market data shapes.

use serde::Deserialize;
use serde_json::Value;

use super::{de_opt_f64, de_opt_string, de_opt_u32, de_string_list, de_value_list, or_default};
use crate::config::UpstreamConfig;
use crate::http_client::HttpRequest;
use crate::query::{Category, LogicalQuery};

/// Builds the CoinGecko request for a market-data query.
pub fn request_for(query: &LogicalQuery, upstream: &UpstreamConfig) -> HttpRequest {
    let coin_id = urlencoding::encode(query.coin_id().unwrap_or_default()).into_owned();
    let count = query.count().to_string();

    let request = match query.category() {
        Category::Listing => HttpRequest::get(upstream.endpoint("coins/markets"))
            .with_query("vs_currency", "usd")
            .with_query("order", "market_cap_desc")
            .with_query("per_page", &count)
            .with_query("page", "1")
            .with_query("sparkline", "false")
            .with_query("price_change_percentage", "24h"),
        Category::Detail => HttpRequest::get(upstream.endpoint(&format!("coins/{coin_id}")))
            .with_query("localization", "false")
            .with_query("tickers", "true")
            .with_query("market_data", "true")
            .with_query("community_data", "false")
            .with_query("developer_data", "false"),
        Category::History => {
            HttpRequest::get(upstream.endpoint(&format!("coins/{coin_id}/market_chart")))
                .with_query("vs_currency", "usd")
                .with_query("days", query.time_period().upstream_days())
        }
        Category::Exchanges => HttpRequest::get(upstream.endpoint("exchanges"))
            .with_query("per_page", &count)
            .with_query("page", "1"),
        Category::News => HttpRequest::get(upstream.endpoint("news")),
    };

    request.with_auth(&upstream.auth)
}

/// Element of `/coins/markets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMarketCoin {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub market_cap_rank: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub total_volume: Option<f64>,
}

/// `/coins/{id}` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoinDetail {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub image: RawImage,
    #[serde(default, deserialize_with = "or_default")]
    pub description: RawLocalized,
    #[serde(default, deserialize_with = "or_default")]
    pub links: RawLinks,
    /// `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "de_opt_string")]
    pub genesis_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub market_cap_rank: Option<u32>,
    #[serde(default, deserialize_with = "or_default")]
    pub market_data: RawMarketData,
    #[serde(default, deserialize_with = "de_value_list")]
    pub tickers: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub large: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub small: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocalized {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub en: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLinks {
    #[serde(default, deserialize_with = "de_string_list")]
    pub homepage: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub blockchain_site: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub official_forum_url: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub subreddit_url: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub repos_url: RawRepos,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRepos {
    #[serde(default, deserialize_with = "de_string_list")]
    pub github: Vec<String>,
}

/// Per-currency amounts; only USD is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrencyAmounts {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMarketData {
    #[serde(default, deserialize_with = "or_default")]
    pub current_price: RawCurrencyAmounts,
    #[serde(default, deserialize_with = "or_default")]
    pub market_cap: RawCurrencyAmounts,
    #[serde(default, deserialize_with = "or_default")]
    pub total_volume: RawCurrencyAmounts,
    #[serde(default, deserialize_with = "or_default")]
    pub ath: RawCurrencyAmounts,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub total_supply: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub circulating_supply: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTicker {
    #[serde(default, deserialize_with = "or_default")]
    pub market: RawTickerMarket,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTickerMarket {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub identifier: Option<String>,
}

/// `/coins/{id}/market_chart` document; `prices` holds `[unix_ms, price]` pairs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMarketChart {
    #[serde(default, deserialize_with = "de_value_list")]
    pub prices: Vec<Value>,
}

impl RawMarketChart {
    /// Well-formed `[timestamp, price]` pairs; malformed samples are skipped.
    pub fn price_pairs(&self) -> Vec<(i64, f64)> {
        self.prices
            .iter()
            .filter_map(|sample| {
                let pair = sample.as_array()?;
                let timestamp = pair.first().and_then(number_as_f64)?;
                let price = pair.get(1).and_then(number_as_f64)?;
                (timestamp.is_finite() && price.is_finite()).then_some((timestamp as i64, price))
            })
            .collect()
    }
}

fn number_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Element of `/exchanges`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExchange {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub year_established: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub trust_score: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub trust_score_rank: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub trade_volume_24h_btc: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::{ProviderId, TimePeriod};

    fn market() -> UpstreamConfig {
        DashboardConfig::default()
            .upstream(ProviderId::CoinGecko)
            .clone()
    }

    #[test]
    fn listing_request_carries_count_and_currency() {
        let query = LogicalQuery::listing(10).expect("valid query");
        let request = request_for(&query, &market());

        assert!(request
            .url
            .starts_with("https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd"));
        assert!(request.url.contains("per_page=10"));
    }

    #[test]
    fn history_request_maps_period_to_days() {
        let query = LogicalQuery::history("bitcoin", TimePeriod::ThreeHours).expect("valid query");
        let request = request_for(&query, &market());

        assert_eq!(
            request.url,
            "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart?vs_currency=usd&days=1"
        );
    }

    #[test]
    fn coin_id_is_path_encoded() {
        let query = LogicalQuery::detail("wrapped bitcoin").expect("valid query");
        let request = request_for(&query, &market());

        assert!(request.url.contains("/coins/wrapped%20bitcoin?"));
    }

    #[test]
    fn market_chart_skips_malformed_samples() {
        let chart: RawMarketChart = serde_json::from_str(
            r#"{"prices":[[1000,100.5],[2000],"x",[3000,"101.25"],[null,5]]}"#,
        )
        .expect("chart decodes");

        assert_eq!(chart.price_pairs(), vec![(1000, 100.5), (3000, 101.25)]);
    }
}
