use super::round_to_cents;
use crate::query::LogicalQuery;
use crate::upstream::coingecko::RawMarketChart;
use crate::upstream::parse_document;
use crate::{PriceHistory, PricePoint};

/// Ascending price series for the query's period plus its percent change.
///
/// Periods narrower than the fetched window are trimmed relative to the
/// newest point.
pub fn transform(body: &str, query: &LogicalQuery) -> PriceHistory {
    let chart: RawMarketChart = parse_document(body);

    let mut history = chart
        .price_pairs()
        .into_iter()
        .map(|(timestamp, price)| PricePoint { timestamp, price })
        .collect::<Vec<_>>();
    history.sort_by_key(|point| point.timestamp);

    if let (Some(window), Some(newest)) = (query.time_period().trim_window(), history.last()) {
        let cutoff = newest.timestamp.saturating_sub(window.as_millis() as i64);
        history.retain(|point| point.timestamp >= cutoff);
    }

    let change = percent_change(&history);
    PriceHistory { history, change }
}

/// `(last - first) / first * 100`, rounded to two decimals. Zero for an empty
/// series, a zero first price, or any result that is not finite.
pub fn percent_change(history: &[PricePoint]) -> f64 {
    let change = match (history.first(), history.last()) {
        (Some(first), Some(last)) if first.price != 0.0 => {
            round_to_cents((last.price - first.price) / first.price * 100.0)
        }
        _ => 0.0,
    };
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimePeriod;

    fn query(period: TimePeriod) -> LogicalQuery {
        LogicalQuery::history("bitcoin", period).expect("valid query")
    }

    #[test]
    fn unsorted_samples_are_ordered_ascending() {
        let history = transform(
            r#"{"prices":[[3000,120],[1000,100],[2000,110]]}"#,
            &query(TimePeriod::SevenDays),
        );

        let timestamps = history.history.iter().map(|p| p.timestamp).collect::<Vec<_>>();
        assert_eq!(timestamps, vec![1000, 2000, 3000]);
        assert_eq!(history.change, 20.0);
    }

    #[test]
    fn zero_first_price_reports_no_change() {
        let history = transform(r#"{"prices":[[1000,0],[2000,5]]}"#, &query(TimePeriod::OneDay));

        assert_eq!(history.change, 0.0);
        assert!(history.change.is_finite());
        assert_eq!(history.history.len(), 2);
    }

    #[test]
    fn three_hour_period_keeps_only_last_three_hours() {
        let hour = 3_600_000_i64;
        let body = format!(
            r#"{{"prices":[[0,10],[{},11],[{},12],[{},13],[{},14]]}}"#,
            hour,
            2 * hour,
            4 * hour,
            5 * hour
        );

        let history = transform(&body, &query(TimePeriod::ThreeHours));

        let timestamps = history.history.iter().map(|p| p.timestamp).collect::<Vec<_>>();
        assert_eq!(timestamps, vec![2 * hour, 4 * hour, 5 * hour]);
        assert_eq!(history.formatted_change(), "16.67");
    }

    #[test]
    fn tiny_first_price_cannot_produce_infinite_change() {
        let history = transform(
            r#"{"prices":[[1,1e-300],[2,1e300]]}"#,
            &query(TimePeriod::OneDay),
        );

        assert_eq!(history.change, 0.0);
        let json = serde_json::to_value(&history).expect("history serializes");
        assert_eq!(json["change"], 0.0);
    }

    #[test]
    fn extreme_timestamps_are_trimmed_without_overflow() {
        let history = transform(r#"{"prices":[[-1e30,5]]}"#, &query(TimePeriod::ThreeHours));

        assert_eq!(history.history.len(), 1);
        assert_eq!(history.history[0].timestamp, i64::MIN);
        assert_eq!(history.change, 0.0);
    }

    #[test]
    fn negative_change_is_rounded() {
        let history = transform(r#"{"prices":[[1,300],[2,200]]}"#, &query(TimePeriod::OneDay));
        assert_eq!(history.change, -33.33);
    }
}
