//! # Domain Models
//!
//! Normalized record shapes consumed by dashboard views.
//!
//! Every type here is produced by a transformer in [`crate::transform`] and is
//! always well-formed: missing upstream fields collapse to an empty string,
//! zero, or an empty sequence rather than an error.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CoinSummary`] | Listing row (price, market cap, 24h change, rank) |
//! | [`CoinDetail`] | Listing row plus profile, supply and market counts |
//! | [`PriceHistory`] | Ascending [`PricePoint`] series with percent change |
//! | [`ExchangeSummary`] | Exchange row (volume in BTC, country, trust) |
//! | [`NewsFeed`] | News items, flagged when placeholders were substituted |
//! | [`NormalizedRecord`] | Category-tagged union of the above |
//! | [`TimePeriod`] | Chart window selector |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod period;
mod timestamp;

pub use models::{
    CoinDetail, CoinLink, CoinSummary, ExchangeSummary, GlobalStats, NewsFeed, NewsItem,
    NormalizedRecord, PriceHistory, PricePoint,
};
pub use period::{available_periods, default_period, TimePeriod};
pub use timestamp::UtcDateTime;
