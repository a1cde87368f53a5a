use coinboard_core::{
    available_periods, default_period, LogicalQuery, QueryFacade, TimePeriod, UtcDateTime,
};
use serde::Serialize;

use crate::cli::CoinArgs;
use crate::error::CliError;

use super::{from_response, CommandResult};

#[derive(Debug, Serialize)]
struct PeriodsResponseData {
    coin_id: String,
    listed_at: i64,
    periods: Vec<TimePeriod>,
    default_period: TimePeriod,
}

pub async fn run(args: &CoinArgs, facade: &QueryFacade) -> Result<CommandResult, CliError> {
    let query = LogicalQuery::detail(&args.id)?;
    let response = facade.query(&query).await;

    from_response(query.category(), response, |record| {
        let detail = record.as_detail().ok_or_else(|| {
            CliError::Command(String::from("detail query returned another category"))
        })?;
        let periods = available_periods(detail.listed_at, UtcDateTime::now());

        Ok(serde_json::to_value(PeriodsResponseData {
            coin_id: detail.summary.id.clone(),
            listed_at: detail.listed_at,
            default_period: default_period(&periods),
            periods,
        })?)
    })
}
