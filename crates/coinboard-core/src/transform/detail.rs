use std::collections::BTreeSet;

use time::macros::format_description;
use time::Date;

use super::text;
use crate::upstream::coingecko::{RawCoinDetail, RawLinks, RawTicker};
use crate::upstream::{decode_items, first_non_empty, parse_document};
use crate::{CoinDetail, CoinLink, CoinSummary, UtcDateTime};

/// Coin profile. `listed_at` is the genesis date at midnight UTC, or
/// `received_at` when the upstream has none.
pub fn transform(body: &str, received_at: UtcDateTime) -> CoinDetail {
    let mut raw: RawCoinDetail = parse_document(body);
    let tickers: Vec<RawTicker> = decode_items(std::mem::take(&mut raw.tickers));
    let market = &raw.market_data;
    let exchange_names = tickers
        .iter()
        .filter_map(|ticker| first_non_empty([ticker.market.name.as_deref()]))
        .collect::<BTreeSet<_>>();

    let summary = CoinSummary {
        id: text(raw.id.as_deref()),
        symbol: text(raw.symbol.as_deref()).to_ascii_uppercase(),
        name: text(raw.name.as_deref()),
        icon_url: first_non_empty([
            raw.image.large.as_deref(),
            raw.image.small.as_deref(),
            raw.image.thumb.as_deref(),
        ])
        .unwrap_or_default()
        .to_owned(),
        price: market.current_price.usd.unwrap_or_default(),
        market_cap: market.market_cap.usd.unwrap_or_default(),
        change_24h: market.price_change_percentage_24h.unwrap_or_default(),
        volume_24h: market.total_volume.usd.unwrap_or_default(),
        rank: raw.market_cap_rank.unwrap_or_default(),
    };

    CoinDetail {
        summary,
        description: text(raw.description.en.as_deref()),
        website_url: first_non_empty(raw.links.homepage.iter().map(|url| Some(url.as_str())))
            .unwrap_or_default()
            .to_owned(),
        links: links(&raw.links),
        all_time_high_price: market.ath.usd.unwrap_or_default(),
        total_supply: market.total_supply.unwrap_or_default(),
        circulating_supply: market.circulating_supply.unwrap_or_default(),
        number_of_markets: tickers.len() as u64,
        number_of_exchanges: exchange_names.len() as u64,
        listed_at: raw
            .genesis_date
            .as_deref()
            .and_then(parse_genesis_date)
            .unwrap_or_else(|| received_at.unix_seconds()),
    }
}

fn parse_genesis_date(raw: &str) -> Option<i64> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), &format)
        .ok()
        .map(|date| date.midnight().assume_utc().unix_timestamp())
}

fn links(raw: &RawLinks) -> Vec<CoinLink> {
    let groups: [(&str, Vec<&str>); 5] = [
        ("website", raw.homepage.iter().map(String::as_str).collect()),
        ("explorer", raw.blockchain_site.iter().map(String::as_str).collect()),
        ("forum", raw.official_forum_url.iter().map(String::as_str).collect()),
        ("reddit", raw.subreddit_url.as_deref().into_iter().collect()),
        ("github", raw.repos_url.github.iter().map(String::as_str).collect()),
    ];

    let mut seen = BTreeSet::new();
    let mut links = Vec::new();
    for (kind, urls) in groups {
        for url in urls.into_iter().map(str::trim).filter(|url| !url.is_empty()) {
            if seen.insert(url.to_owned()) {
                links.push(CoinLink {
                    kind: kind.to_owned(),
                    name: link_name(url),
                    url: url.to_owned(),
                });
            }
        }
    }
    links
}

/// Host without a leading `www.`, or the URL itself when it does not parse.
fn link_name(url: &str) -> String {
    let host = reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_owned));
    match host {
        Some(host) => host.trim_start_matches("www.").to_owned(),
        None => url.to_owned(),
    }
}
