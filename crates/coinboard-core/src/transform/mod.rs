//! Raw upstream documents to normalized records.
//!
//! Transformers are pure and total: any body, including invalid JSON, yields a
//! well-formed record. Missing fields fall back to an empty string, zero, or
//! an empty sequence.
//!
//! | Category | Upstream document | Record |
//! |----------|-------------------|--------|
//! | Listing | `/coins/markets` array | `Vec<CoinSummary>` |
//! | Detail | `/coins/{id}` object | [`CoinDetail`](crate::CoinDetail) |
//! | History | `/coins/{id}/market_chart` object | [`PriceHistory`](crate::PriceHistory) |
//! | Exchanges | `/exchanges` array | `Vec<ExchangeSummary>` |
//! | News | `/news/` envelope | [`NewsFeed`](crate::NewsFeed) |

pub mod detail;
pub mod exchanges;
pub mod history;
pub mod listing;
pub mod news;

use crate::query::{Category, LogicalQuery};
use crate::{NormalizedRecord, UtcDateTime};

/// Normalizes `body` for `query`. `received_at` stands in for timestamps the
/// upstream omits.
pub fn transform(body: &str, query: &LogicalQuery, received_at: UtcDateTime) -> NormalizedRecord {
    match query.category() {
        Category::Listing => NormalizedRecord::Listing(listing::transform(body, query)),
        Category::Detail => {
            NormalizedRecord::Detail(Box::new(detail::transform(body, received_at)))
        }
        Category::History => NormalizedRecord::History(history::transform(body, query)),
        Category::Exchanges => NormalizedRecord::Exchanges(exchanges::transform(body, query)),
        Category::News => NormalizedRecord::News(news::transform(body, query, received_at)),
    }
}

pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_owned()
}
