use serde_json::Value;

use super::text;
use crate::query::LogicalQuery;
use crate::upstream::coingecko::RawExchange;
use crate::upstream::{decode_items, parse_document};
use crate::ExchangeSummary;

pub fn transform(body: &str, query: &LogicalQuery) -> Vec<ExchangeSummary> {
    let items: Vec<Value> = parse_document(body);
    let exchanges: Vec<RawExchange> = decode_items(items);

    exchanges
        .into_iter()
        .take(query.count())
        .enumerate()
        .map(|(position, raw)| summarize(raw, position))
        .collect()
}

fn summarize(raw: RawExchange, position: usize) -> ExchangeSummary {
    let name = text(raw.name.as_deref());
    let description = match text(raw.description.as_deref()) {
        description if description.is_empty() => synthesized_description(&name),
        description => description,
    };

    ExchangeSummary {
        id: text(raw.id.as_deref()),
        rank: raw
            .trust_score_rank
            .unwrap_or_else(|| u32::try_from(position + 1).unwrap_or(u32::MAX)),
        image_url: text(raw.image.as_deref()),
        volume_24h_btc: raw.trade_volume_24h_btc.unwrap_or_default(),
        country: text(raw.country.as_deref()),
        year_established: raw.year_established.unwrap_or_default(),
        description,
        trust_score: raw.trust_score.unwrap_or_default(),
        url: text(raw.url.as_deref()),
        name,
    }
}

pub fn synthesized_description(name: &str) -> String {
    format!("{name} is a cryptocurrency exchange.")
}
