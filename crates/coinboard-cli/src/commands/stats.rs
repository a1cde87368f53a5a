use coinboard_core::{CoinSummary, GlobalStats, LogicalQuery, QueryFacade};
use serde::Serialize;

use crate::cli::CountArgs;
use crate::error::CliError;

use super::{from_response, CommandResult};

#[derive(Debug, Serialize)]
struct StatsResponseData<'a> {
    stats: GlobalStats,
    top_coins: &'a [CoinSummary],
}

pub async fn run(args: &CountArgs, facade: &QueryFacade) -> Result<CommandResult, CliError> {
    let query = LogicalQuery::listing(args.count)?;
    let response = facade.query(&query).await;

    from_response(query.category(), response, |record| {
        let coins = record.as_listing().unwrap_or_default();
        Ok(serde_json::to_value(StatsResponseData {
            stats: GlobalStats::from_coins(coins),
            top_coins: coins,
        })?)
    })
}
