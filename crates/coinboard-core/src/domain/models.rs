use serde::{Deserialize, Serialize};

use crate::query::Category;
use crate::UtcDateTime;

/// One row of the market listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub icon_url: String,
    pub price: f64,
    pub market_cap: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub rank: u32,
}

/// Named outbound link attached to a coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinLink {
    pub kind: String,
    pub name: String,
    pub url: String,
}

/// Full coin profile: listing fields plus supply, market and profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    #[serde(flatten)]
    pub summary: CoinSummary,
    pub description: String,
    pub website_url: String,
    pub links: Vec<CoinLink>,
    pub all_time_high_price: f64,
    pub total_supply: f64,
    pub circulating_supply: f64,
    pub number_of_markets: u64,
    pub number_of_exchanges: u64,
    /// Unix seconds.
    pub listed_at: i64,
}

/// Single sample of a price chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub price: f64,
}

/// Price chart ordered ascending by timestamp, with the percent change over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub history: Vec<PricePoint>,
    /// Percent change from first to last point, rounded to two decimals.
    pub change: f64,
}

impl PriceHistory {
    pub fn empty() -> Self {
        Self {
            history: Vec::new(),
            change: 0.0,
        }
    }

    pub fn formatted_change(&self) -> String {
        format!("{:.2}", self.change)
    }

    pub fn latest(&self) -> Option<PricePoint> {
        self.history.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSummary {
    pub id: String,
    pub name: String,
    pub rank: u32,
    pub image_url: String,
    pub volume_24h_btc: f64,
    pub country: String,
    pub year_established: u32,
    pub description: String,
    pub trust_score: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: UtcDateTime,
    pub thumbnail_url: String,
    pub provider_name: String,
    pub provider_image_url: String,
    pub category: String,
}

/// News result; `is_placeholder` marks synthesized items that did not come from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsFeed {
    pub items: Vec<NewsItem>,
    pub is_placeholder: bool,
}

/// Category-specific normalized payload stored in the cache and handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "snake_case")]
pub enum NormalizedRecord {
    Listing(Vec<CoinSummary>),
    Detail(Box<CoinDetail>),
    History(PriceHistory),
    Exchanges(Vec<ExchangeSummary>),
    News(NewsFeed),
}

impl NormalizedRecord {
    pub const fn category(&self) -> Category {
        match self {
            Self::Listing(_) => Category::Listing,
            Self::Detail(_) => Category::Detail,
            Self::History(_) => Category::History,
            Self::Exchanges(_) => Category::Exchanges,
            Self::News(_) => Category::News,
        }
    }

    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::News(feed) if feed.is_placeholder)
    }

    pub fn as_listing(&self) -> Option<&[CoinSummary]> {
        match self {
            Self::Listing(coins) => Some(coins),
            _ => None,
        }
    }

    pub fn as_detail(&self) -> Option<&CoinDetail> {
        match self {
            Self::Detail(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_history(&self) -> Option<&PriceHistory> {
        match self {
            Self::History(history) => Some(history),
            _ => None,
        }
    }

    pub fn as_exchanges(&self) -> Option<&[ExchangeSummary]> {
        match self {
            Self::Exchanges(exchanges) => Some(exchanges),
            _ => None,
        }
    }

    pub fn as_news(&self) -> Option<&NewsFeed> {
        match self {
            Self::News(feed) => Some(feed),
            _ => None,
        }
    }
}

/// Aggregate figures over a market listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub coins_displayed: usize,
    pub total_market_cap: f64,
    pub total_volume_24h: f64,
}

impl GlobalStats {
    pub fn from_coins(coins: &[CoinSummary]) -> Self {
        Self {
            coins_displayed: coins.len(),
            total_market_cap: coins.iter().map(|coin| coin.market_cap).sum(),
            total_volume_24h: coins.iter().map(|coin| coin.volume_24h).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, market_cap: f64, volume: f64) -> CoinSummary {
        CoinSummary {
            id: id.to_owned(),
            symbol: id.to_owned(),
            name: id.to_owned(),
            icon_url: String::new(),
            price: 1.0,
            market_cap,
            change_24h: 0.0,
            volume_24h: volume,
            rank: 1,
        }
    }

    #[test]
    fn global_stats_sum_market_cap_and_volume() {
        let stats = GlobalStats::from_coins(&[coin("a", 100.0, 10.0), coin("b", 50.0, 5.0)]);

        assert_eq!(stats.coins_displayed, 2);
        assert_eq!(stats.total_market_cap, 150.0);
        assert_eq!(stats.total_volume_24h, 15.0);
    }

    #[test]
    fn only_placeholder_news_counts_as_placeholder() {
        let feed = NormalizedRecord::News(NewsFeed {
            items: Vec::new(),
            is_placeholder: true,
        });
        assert!(feed.is_placeholder());
        assert!(!NormalizedRecord::Listing(Vec::new()).is_placeholder());
        assert_eq!(feed.category(), Category::News);
    }

    #[test]
    fn detail_serializes_summary_fields_inline() {
        let detail = CoinDetail {
            summary: coin("bitcoin", 1.0, 1.0),
            description: String::new(),
            website_url: String::new(),
            links: Vec::new(),
            all_time_high_price: 0.0,
            total_supply: 0.0,
            circulating_supply: 0.0,
            number_of_markets: 0,
            number_of_exchanges: 0,
            listed_at: 0,
        };

        let value = serde_json::to_value(&detail).expect("detail serializes");
        assert_eq!(value["id"], "bitcoin");
        assert!(value.get("summary").is_none());
    }
}
