//! Logical queries and their canonical cache keys.
//!
//! A [`LogicalQuery`] is the caller's intent: a [`Category`] plus string
//! parameters. Parameters live in a sorted map, so two queries built from the
//! same pairs in any insertion order produce the same [`CacheKey`].

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProviderId, TimePeriod, ValidationError};

pub const PARAM_COUNT: &str = "count";
pub const PARAM_COIN_ID: &str = "coinId";
pub const PARAM_TIME_PERIOD: &str = "timePeriod";
pub const PARAM_NEWS_CATEGORY: &str = "newsCategory";

/// News category meaning "no category filter".
pub const DEFAULT_NEWS_CATEGORY: &str = "Cryptocurrency";

/// Upstream data category of a logical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Listing,
    Detail,
    History,
    Exchanges,
    News,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Listing,
        Self::Detail,
        Self::History,
        Self::Exchanges,
        Self::News,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Detail => "detail",
            Self::History => "history",
            Self::Exchanges => "exchanges",
            Self::News => "news",
        }
    }

    pub const fn provider(self) -> ProviderId {
        match self {
            Self::News => ProviderId::CryptoCompare,
            Self::Listing | Self::Detail | Self::History | Self::Exchanges => ProviderId::CoinGecko,
        }
    }

    /// Item count used when the query carries no `count` parameter.
    pub const fn default_count(self) -> usize {
        match self {
            Self::News => 12,
            Self::Listing | Self::Exchanges => 100,
            Self::Detail | Self::History => 1,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidCategory {
                value: trimmed.to_owned(),
            })
    }
}

/// Canonical serialization of a logical query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable caller intent: category plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalQuery {
    category: Category,
    parameters: BTreeMap<String, String>,
}

impl LogicalQuery {
    /// Builds a query from raw parameter pairs, validating category requirements.
    ///
    /// Keys and values are trimmed. A repeated key keeps its last value.
    pub fn new<I, K, V>(category: Category, parameters: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut normalized = BTreeMap::new();
        for (key, value) in parameters {
            let key = key.into().trim().to_owned();
            if key.is_empty() {
                return Err(ValidationError::EmptyParameterKey);
            }
            normalized.insert(key, value.into().trim().to_owned());
        }

        let query = Self {
            category,
            parameters: normalized,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn listing(count: usize) -> Result<Self, ValidationError> {
        Self::new(Category::Listing, [(PARAM_COUNT, count.to_string())])
    }

    pub fn detail(coin_id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(Category::Detail, [(PARAM_COIN_ID, coin_id.into())])
    }

    pub fn history(
        coin_id: impl Into<String>,
        period: TimePeriod,
    ) -> Result<Self, ValidationError> {
        Self::new(
            Category::History,
            [
                (PARAM_COIN_ID, coin_id.into()),
                (PARAM_TIME_PERIOD, period.as_str().to_owned()),
            ],
        )
    }

    pub fn exchanges(count: usize) -> Result<Self, ValidationError> {
        Self::new(Category::Exchanges, [(PARAM_COUNT, count.to_string())])
    }

    pub fn news(news_category: impl Into<String>, count: usize) -> Result<Self, ValidationError> {
        Self::new(
            Category::News,
            [
                (PARAM_NEWS_CATEGORY, news_category.into()),
                (PARAM_COUNT, count.to_string()),
            ],
        )
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(raw) = self.parameter(PARAM_COUNT) {
            parse_count(raw)?;
        }

        match self.category {
            Category::Detail | Category::History => {
                match self.parameter(PARAM_COIN_ID) {
                    None => {
                        return Err(ValidationError::MissingParameter {
                            category: self.category.as_str(),
                            parameter: PARAM_COIN_ID,
                        })
                    }
                    Some("") => return Err(ValidationError::EmptyCoinId),
                    Some(_) => {}
                }
                if let Some(raw) = self.parameter(PARAM_TIME_PERIOD) {
                    raw.parse::<TimePeriod>()?;
                }
            }
            Category::Listing | Category::Exchanges | Category::News => {}
        }

        Ok(())
    }

    pub const fn category(&self) -> Category {
        self.category
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Requested item count, falling back to the category default.
    pub fn count(&self) -> usize {
        self.parameter(PARAM_COUNT)
            .and_then(|raw| parse_count(raw).ok())
            .unwrap_or_else(|| self.category.default_count())
    }

    pub fn coin_id(&self) -> Option<&str> {
        self.parameter(PARAM_COIN_ID)
    }

    pub fn time_period(&self) -> TimePeriod {
        self.parameter(PARAM_TIME_PERIOD)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// News category filter, or `None` for the unfiltered feed.
    pub fn news_category(&self) -> Option<&str> {
        self.parameter(PARAM_NEWS_CATEGORY)
            .filter(|category| !category.is_empty() && *category != DEFAULT_NEWS_CATEGORY)
    }

    pub fn cache_key(&self) -> CacheKey {
        let encoded = self
            .parameters
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");

        CacheKey(format!("{}?{}", self.category.as_str(), encoded))
    }
}

impl Display for LogicalQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cache_key().as_str())
    }
}

fn parse_count(raw: &str) -> Result<usize, ValidationError> {
    match raw.parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ValidationError::InvalidCount {
            parameter: PARAM_COUNT,
            value: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_parameter_insertion_order() {
        let forward = LogicalQuery::new(
            Category::History,
            [("coinId", "bitcoin"), ("timePeriod", "7d")],
        )
        .expect("valid query");
        let reversed = LogicalQuery::new(
            Category::History,
            [("timePeriod", "7d"), ("coinId", "bitcoin")],
        )
        .expect("valid query");

        assert_eq!(forward.cache_key(), reversed.cache_key());
        assert_eq!(forward.cache_key().as_str(), "history?coinId=bitcoin&timePeriod=7d");
    }

    #[test]
    fn cache_key_differs_by_category_and_values() {
        let listing = LogicalQuery::listing(10).expect("valid");
        let exchanges = LogicalQuery::exchanges(10).expect("valid");
        let larger = LogicalQuery::listing(20).expect("valid");

        assert_ne!(listing.cache_key(), exchanges.cache_key());
        assert_ne!(listing.cache_key(), larger.cache_key());
    }

    #[test]
    fn cache_key_escapes_separators_in_values() {
        let tricky = LogicalQuery::news("a&count=1", 5).expect("valid");
        let plain = LogicalQuery::news("a", 1).expect("valid");

        assert_ne!(tricky.cache_key(), plain.cache_key());
    }

    #[test]
    fn detail_requires_coin_id() {
        let error = LogicalQuery::new(Category::Detail, Vec::<(String, String)>::new())
            .expect_err("missing coin id");
        assert!(matches!(error, ValidationError::MissingParameter { parameter: "coinId", .. }));

        let error = LogicalQuery::detail("   ").expect_err("blank coin id");
        assert_eq!(error, ValidationError::EmptyCoinId);
    }

    #[test]
    fn zero_or_non_numeric_count_is_rejected() {
        assert!(matches!(
            LogicalQuery::listing(0),
            Err(ValidationError::InvalidCount { .. })
        ));
        assert!(matches!(
            LogicalQuery::new(Category::Exchanges, [("count", "ten")]),
            Err(ValidationError::InvalidCount { .. })
        ));
    }

    #[test]
    fn history_rejects_unknown_period() {
        let error = LogicalQuery::new(
            Category::History,
            [("coinId", "bitcoin"), ("timePeriod", "2w")],
        )
        .expect_err("unknown period");
        assert!(matches!(error, ValidationError::InvalidTimePeriod { .. }));
    }

    #[test]
    fn accessors_fall_back_to_category_defaults() {
        let news = LogicalQuery::new(Category::News, Vec::<(String, String)>::new())
            .expect("valid");
        assert_eq!(news.count(), 12);
        assert_eq!(news.news_category(), None);

        let history = LogicalQuery::new(Category::History, [("coinId", "eth")]).expect("valid");
        assert_eq!(history.time_period(), TimePeriod::SevenDays);

        let filtered = LogicalQuery::news("Bitcoin", 6).expect("valid");
        assert_eq!(filtered.news_category(), Some("Bitcoin"));
        assert_eq!(
            LogicalQuery::news(DEFAULT_NEWS_CATEGORY, 6)
                .expect("valid")
                .news_category(),
            None
        );
    }

    #[test]
    fn category_parses_from_label() {
        assert_eq!("Exchanges".parse::<Category>(), Ok(Category::Exchanges));
        assert_eq!(Category::News.provider(), ProviderId::CryptoCompare);
        assert!("prices".parse::<Category>().is_err());
    }
}
