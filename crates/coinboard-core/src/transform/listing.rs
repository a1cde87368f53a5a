use serde_json::Value;

use super::text;
use crate::query::LogicalQuery;
use crate::upstream::coingecko::RawMarketCoin;
use crate::upstream::{decode_items, parse_document};
use crate::CoinSummary;

/// Top `query.count()` coins. A missing upstream rank becomes the 1-based position.
pub fn transform(body: &str, query: &LogicalQuery) -> Vec<CoinSummary> {
    let items: Vec<Value> = parse_document(body);
    let coins: Vec<RawMarketCoin> = decode_items(items);

    coins
        .into_iter()
        .take(query.count())
        .enumerate()
        .map(|(position, raw)| summarize(raw, position))
        .collect()
}

fn summarize(raw: RawMarketCoin, position: usize) -> CoinSummary {
    CoinSummary {
        id: text(raw.id.as_deref()),
        symbol: text(raw.symbol.as_deref()).to_ascii_uppercase(),
        name: text(raw.name.as_deref()),
        icon_url: text(raw.image.as_deref()),
        price: raw.current_price.unwrap_or_default(),
        market_cap: raw.market_cap.unwrap_or_default(),
        change_24h: raw.price_change_percentage_24h.unwrap_or_default(),
        volume_24h: raw.total_volume.unwrap_or_default(),
        rank: raw
            .market_cap_rank
            .unwrap_or_else(|| u32::try_from(position + 1).unwrap_or(u32::MAX)),
    }
}
