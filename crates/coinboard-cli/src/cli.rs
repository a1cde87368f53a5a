//! CLI argument definitions for coinboard.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `coins` | Top coins by market cap |
//! | `coin` | Full profile of one coin |
//! | `history` | Price chart for one coin |
//! | `exchanges` | Exchanges ranked by trust |
//! | `news` | Latest news, optionally by category |
//! | `stats` | Totals over the top coins |
//! | `periods` | Chart periods a coin has enough history for |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--verbose` | `false` | Debug logging on stderr (overridden by `RUST_LOG`) |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//! | `--max-retries` | env or `2` | Extra attempts on transient failures |
//!
//! # Examples
//!
//! ```bash
//! coinboard coins --count 10 --pretty
//! coinboard history bitcoin --period 30d
//! coinboard news --category Bitcoin --count 6
//! ```

use clap::{Args, Parser, Subcommand};

/// Crypto market dashboard data from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "coinboard",
    author,
    version,
    about = "Crypto market, exchange and news data with rate limiting and caching",
    long_about = "coinboard queries public crypto market-data and news APIs through a \
rate-limited, retrying, cached pipeline and prints normalized JSON.\n\
\n\
Use 'coinboard <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log pipeline activity (cache, rate limiting, retries) to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Additional attempts for transient upstream failures.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Top coins by market cap.
    ///
    ///   coinboard coins
    ///   coinboard coins --count 100
    Coins(CountArgs),

    /// Full profile of one coin.
    ///
    ///   coinboard coin bitcoin
    Coin(CoinArgs),

    /// Price history of one coin over a period (3h, 24h, 7d, 30d, 3m, 1y, 3y, 5y).
    ///
    ///   coinboard history ethereum --period 30d
    History(HistoryArgs),

    /// Exchanges ranked by trust score.
    Exchanges(ExchangesArgs),

    /// Latest crypto news.
    ///
    ///   coinboard news
    ///   coinboard news --category Bitcoin --count 6
    News(NewsArgs),

    /// Global totals over the top coins.
    Stats(CountArgs),

    /// Chart periods available for a coin given its listing date.
    Periods(CoinArgs),
}

#[derive(Debug, Args)]
pub struct CountArgs {
    #[arg(long, default_value_t = 10)]
    pub count: usize,
}

#[derive(Debug, Args)]
pub struct CoinArgs {
    /// Upstream coin id, e.g. `bitcoin`.
    pub id: String,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub id: String,

    #[arg(long, default_value = "7d")]
    pub period: String,
}

#[derive(Debug, Args)]
pub struct ExchangesArgs {
    #[arg(long, default_value_t = 100)]
    pub count: usize,
}

#[derive(Debug, Args)]
pub struct NewsArgs {
    #[arg(long, default_value = "Cryptocurrency")]
    pub category: String,

    #[arg(long, default_value_t = 12)]
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults_to_seven_days() {
        let cli = Cli::try_parse_from(["coinboard", "history", "bitcoin"]).expect("parses");

        match cli.command {
            Command::History(args) => {
                assert_eq!(args.id, "bitcoin");
                assert_eq!(args.period, "7d");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "coinboard",
            "news",
            "--category",
            "Bitcoin",
            "--pretty",
            "-v",
            "--max-retries",
            "4",
        ])
        .expect("parses");

        assert!(cli.pretty);
        assert!(cli.verbose);
        assert_eq!(cli.max_retries, Some(4));
        assert!(matches!(
            cli.command,
            Command::News(NewsArgs { ref category, count: 12 }) if category == "Bitcoin"
        ));
    }

    #[test]
    fn coin_requires_id() {
        assert!(Cli::try_parse_from(["coinboard", "coin"]).is_err());
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        assert!(Cli::try_parse_from(["coinboard", "coins", "--count", "many"]).is_err());
    }
}
