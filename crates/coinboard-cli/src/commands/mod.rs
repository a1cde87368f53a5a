mod periods;
mod stats;

use std::time::Instant;

use coinboard_core::{
    Category, DashboardConfig, FetchError, LogicalQuery, NormalizedRecord, QueryFacade,
    QueryResponse, TimePeriod,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;
use crate::output::{Envelope, EnvelopeError};

pub struct CommandResult {
    pub data: Value,
    pub category: Option<Category>,
    pub status: &'static str,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value, category: Option<Category>) -> Self {
        Self {
            data,
            category,
            status: "fresh",
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hit: false,
        }
    }

    pub fn with_status(mut self, status: &'static str) -> Self {
        self.status = status;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: &FetchError) -> Self {
        self.errors.push(EnvelopeError::from(error));
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    fn into_envelope(self, latency_ms: u64) -> Envelope {
        let mut meta = Metadata::new(self.category, self.status);
        meta.cache_hit = self.cache_hit;
        meta.latency_ms = latency_ms;
        meta.warnings = self.warnings;

        Envelope {
            meta,
            data: self.data,
            errors: self.errors,
        }
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope, CliError> {
    let mut config = DashboardConfig::builder()
        .from_env()
        .with_timeout_ms(cli.timeout_ms);
    if let Some(max_retries) = cli.max_retries {
        config = config.with_max_retries(max_retries);
    }
    let facade = QueryFacade::from_config(config.build());

    let started = Instant::now();
    let result = match &cli.command {
        Command::Coins(args) => execute(&facade, LogicalQuery::listing(args.count)?).await?,
        Command::Coin(args) => execute(&facade, LogicalQuery::detail(&args.id)?).await?,
        Command::History(args) => {
            let period = args.period.parse::<TimePeriod>()?;
            execute(&facade, LogicalQuery::history(&args.id, period)?).await?
        }
        Command::Exchanges(args) => {
            execute(&facade, LogicalQuery::exchanges(args.count)?).await?
        }
        Command::News(args) => {
            execute(&facade, LogicalQuery::news(&args.category, args.count)?).await?
        }
        Command::Stats(args) => stats::run(args, &facade).await?,
        Command::Periods(args) => periods::run(args, &facade).await?,
    };

    Ok(result.into_envelope(started.elapsed().as_millis() as u64))
}

async fn execute(facade: &QueryFacade, query: LogicalQuery) -> Result<CommandResult, CliError> {
    let response = facade.query(&query).await;
    from_response(query.category(), response, record_data)
}

/// Maps a facade response onto a command result, rendering any data with `render`.
pub fn from_response(
    category: Category,
    response: QueryResponse,
    render: impl FnOnce(NormalizedRecord) -> Result<Value, CliError>,
) -> Result<CommandResult, CliError> {
    let category = Some(category);
    Ok(match response {
        QueryResponse::Fresh { data, cache_hit } => {
            CommandResult::ok(render(data)?, category).with_cache_hit(cache_hit)
        }
        QueryResponse::Degraded { data, reason } => CommandResult::ok(render(data)?, category)
            .with_status("degraded")
            .with_warning(format!("placeholder data served: {reason}")),
        QueryResponse::Fetching => CommandResult::ok(Value::Null, category)
            .with_status("fetching")
            .with_warning("an identical query is already in flight"),
        QueryResponse::Error { error } => CommandResult::ok(Value::Null, category)
            .with_status("error")
            .with_error(&error),
    })
}

/// Category payload without the category tag.
fn record_data(record: NormalizedRecord) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(record)?;
    Ok(value
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null))
}
