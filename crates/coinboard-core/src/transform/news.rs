use std::time::Duration;

use crate::query::{LogicalQuery, DEFAULT_NEWS_CATEGORY, PARAM_NEWS_CATEGORY};
use crate::upstream::cryptocompare::{RawNewsArticle, RawNewsEnvelope};
use crate::upstream::{decode_items, first_non_empty, parse_document};
use crate::{NewsFeed, NewsItem, UtcDateTime};

pub const DEFAULT_NEWS_IMAGE: &str =
    "http://coinrevolution.com/wp-content/uploads/2020/06/cryptonews.jpg";
pub const PLACEHOLDER_CATEGORY: &str = "update";
const PLACEHOLDER_URL: &str = "https://www.coingecko.com/en/news";
const PLACEHOLDER_DESCRIPTION: &str =
    "Latest cryptocurrency news and market analysis. Stay updated with the crypto market trends.";

/// First `query.count()` articles with full bodies.
///
/// A payload without a `Data` array yields a placeholder feed.
pub fn transform(body: &str, query: &LogicalQuery, received_at: UtcDateTime) -> NewsFeed {
    let envelope: RawNewsEnvelope = parse_document(body);
    let Some(items) = envelope.items() else {
        return placeholder_feed(query.count(), received_at);
    };

    let requested_category = query
        .parameter(PARAM_NEWS_CATEGORY)
        .filter(|category| !category.is_empty())
        .unwrap_or(DEFAULT_NEWS_CATEGORY);

    let articles: Vec<RawNewsArticle> = decode_items(items);
    NewsFeed {
        items: articles
            .into_iter()
            .take(query.count())
            .map(|raw| article(raw, requested_category, received_at))
            .collect(),
        is_placeholder: false,
    }
}

fn article(raw: RawNewsArticle, requested_category: &str, received_at: UtcDateTime) -> NewsItem {
    let title = first_non_empty([raw.title.as_deref()]).unwrap_or("Crypto News");
    let category = raw
        .categories
        .as_deref()
        .and_then(|categories| first_non_empty(categories.split('|').map(Some)))
        .unwrap_or(requested_category);

    NewsItem {
        title: title.to_owned(),
        url: first_non_empty([raw.url.as_deref(), raw.guid.as_deref()])
            .unwrap_or("#")
            .to_owned(),
        description: first_non_empty([raw.body.as_deref(), raw.title.as_deref()])
            .unwrap_or("Cryptocurrency news update")
            .to_owned(),
        published_at: raw
            .published_on
            .and_then(UtcDateTime::from_unix_seconds)
            .unwrap_or(received_at),
        thumbnail_url: first_non_empty([raw.imageurl.as_deref()])
            .unwrap_or(DEFAULT_NEWS_IMAGE)
            .to_owned(),
        provider_name: first_non_empty([raw.source_info.name.as_deref(), raw.source.as_deref()])
            .unwrap_or("CryptoCompare")
            .to_owned(),
        provider_image_url: first_non_empty([raw.source_info.img.as_deref()])
            .unwrap_or(DEFAULT_NEWS_IMAGE)
            .to_owned(),
        category: category.to_owned(),
    }
}

/// Deterministic stand-in feed: `count` items titled `Crypto Market Update N`,
/// published one hour apart going back from `now`.
pub fn placeholder_feed(count: usize, now: UtcDateTime) -> NewsFeed {
    let items = (0..count)
        .map(|index| NewsItem {
            title: format!("Crypto Market Update {}", index + 1),
            url: PLACEHOLDER_URL.to_owned(),
            description: PLACEHOLDER_DESCRIPTION.to_owned(),
            published_at: now.saturating_sub(Duration::from_secs(3_600 * index as u64)),
            thumbnail_url: DEFAULT_NEWS_IMAGE.to_owned(),
            provider_name: String::from("Crypto News"),
            provider_image_url: DEFAULT_NEWS_IMAGE.to_owned(),
            category: PLACEHOLDER_CATEGORY.to_owned(),
        })
        .collect();

    NewsFeed {
        items,
        is_placeholder: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> UtcDateTime {
        UtcDateTime::parse("2024-06-01T12:00:00Z").expect("valid timestamp")
    }

    #[test]
    fn articles_use_upstream_fields_and_keep_full_body() {
        let long_body = "x".repeat(2_000);
        let body = format!(
            r#"{{"Type":100,"Data":[{{"title":"ETF flows","url":"https://news.test/a","body":"{long_body}",
            "published_on":1717243200,"imageurl":"https://img.test/a.png","source":"coindesk",
            "source_info":{{"name":"CoinDesk","img":"https://img.test/cd.png"}},"categories":"BTC|ETF"}}]}}"#
        );

        let feed = transform(&body, &LogicalQuery::news("Bitcoin", 5).expect("valid"), now());

        assert!(!feed.is_placeholder);
        let item = &feed.items[0];
        assert_eq!(item.description.len(), 2_000);
        assert_eq!(item.provider_name, "CoinDesk");
        assert_eq!(item.category, "BTC");
        assert_eq!(item.published_at.unix_seconds(), 1_717_243_200);
    }

    #[test]
    fn sparse_article_gets_provider_fallbacks() {
        let body = r#"{"Data":[{"guid":"urn:news:1","source":"theblock"}]}"#;

        let feed = transform(body, &LogicalQuery::news("Cryptocurrency", 5).expect("valid"), now());

        let item = &feed.items[0];
        assert_eq!(item.title, "Crypto News");
        assert_eq!(item.url, "urn:news:1");
        assert_eq!(item.description, "Cryptocurrency news update");
        assert_eq!(item.published_at, now());
        assert_eq!(item.thumbnail_url, DEFAULT_NEWS_IMAGE);
        assert_eq!(item.provider_name, "theblock");
        assert_eq!(item.category, "Cryptocurrency");
    }

    #[test]
    fn malformed_payload_yields_flagged_placeholders() {
        let feed = transform(
            r#"{"Response":"Error","Data":{}}"#,
            &LogicalQuery::news("Bitcoin", 3).expect("valid"),
            now(),
        );

        assert!(feed.is_placeholder);
        assert_eq!(feed.items.len(), 3);
        assert_eq!(feed.items[2].title, "Crypto Market Update 3");
        assert_eq!(feed.items[2].category, PLACEHOLDER_CATEGORY);
        assert_eq!(
            now().unix_seconds() - feed.items[2].published_at.unix_seconds(),
            2 * 3_600
        );
    }

    #[test]
    fn empty_data_array_is_real_but_empty() {
        let query = LogicalQuery::news("Bitcoin", 3).expect("valid");
        let feed = transform(r#"{"Data":[]}"#, &query, now());

        assert!(!feed.is_placeholder);
        assert!(feed.items.is_empty());
    }
}
