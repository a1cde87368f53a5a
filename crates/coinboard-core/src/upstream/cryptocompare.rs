//! CryptoCompare v2 news shapes.

use serde::Deserialize;
use serde_json::Value;

use super::{de_opt_i64, de_opt_string, or_default};
use crate::config::UpstreamConfig;
use crate::http_client::HttpRequest;
use crate::query::LogicalQuery;

/// `/news/?lang=EN`, with a `categories` filter unless the feed is unfiltered.
pub fn request_for(query: &LogicalQuery, upstream: &UpstreamConfig) -> HttpRequest {
    let request = HttpRequest::get(upstream.endpoint("news/")).with_query("lang", "EN");
    let request = match query.news_category() {
        Some(category) => request.with_query("categories", category),
        None => request,
    };
    request.with_auth(&upstream.auth)
}

/// Top-level news document. `Data` is an array on success; error replies
/// carry an object or omit it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNewsEnvelope {
    #[serde(rename = "Data", default)]
    pub data: Option<Value>,
}

impl RawNewsEnvelope {
    /// Items when `Data` is an array, `None` when the payload is malformed.
    pub fn items(self) -> Option<Vec<Value>> {
        match self.data {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNewsArticle {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub guid: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub body: Option<String>,
    /// Unix seconds.
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub published_on: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub imageurl: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub source_info: RawSourceInfo,
    /// Pipe-separated, e.g. `BTC|Trading`.
    #[serde(default, deserialize_with = "de_opt_string")]
    pub categories: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSourceInfo {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub img: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::ProviderId;

    fn news_upstream() -> UpstreamConfig {
        DashboardConfig::default()
            .upstream(ProviderId::CryptoCompare)
            .clone()
    }

    #[test]
    fn default_category_requests_unfiltered_feed() {
        let query = LogicalQuery::news("Cryptocurrency", 12).expect("valid query");
        let request = request_for(&query, &news_upstream());

        assert_eq!(
            request.url,
            "https://min-api.cryptocompare.com/data/v2/news/?lang=EN"
        );
    }

    #[test]
    fn named_category_is_passed_as_filter() {
        let query = LogicalQuery::news("Bitcoin", 6).expect("valid query");
        let request = request_for(&query, &news_upstream());

        assert_eq!(
            request.url,
            "https://min-api.cryptocompare.com/data/v2/news/?lang=EN&categories=Bitcoin"
        );
    }

    #[test]
    fn error_envelope_has_no_items() {
        let envelope: RawNewsEnvelope =
            serde_json::from_str(r#"{"Response":"Error","Message":"rate limit","Data":{}}"#)
                .expect("envelope decodes");

        assert!(envelope.items().is_none());
    }
}
