//! CLI argument definitions for spotlink.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `price` | Last traded price for an asset |
//! | `ticker` | 24 hour rolling statistics for an asset |
//! | `resolve` | Resolve a name to a validated trading pair |
//! | `activity` | Read back the JSON-lines activity log |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | config | Per-attempt request timeout in ms |
//! | `--verbose` | `false` | Debug-level logs on stderr |
//! | `--activity-log` | `SPOTLINK_ACTIVITY_LOG` | Append activity records to this file |
//! | `--no-retry` | `false` | Single attempt per request |
//!
//! # Examples
//!
//! ```bash
//! spotlink price bitcoin
//! spotlink ticker eth --pretty
//! SPOTLINK_LOG=spotlink=debug spotlink resolve dogeusdt
//! spotlink --activity-log activity.log price btc && spotlink --activity-log activity.log activity
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Spot market prices from free-text asset names.
#[derive(Debug, Parser)]
#[command(
    name = "spotlink",
    author,
    version,
    about = "Spot market prices from free-text asset names",
    long_about = "spotlink resolves names such as 'bitcoin', 'eth' or 'SOLUSDT' to a \
trading pair listed on the exchange and fetches its price or 24 hour statistics.\n\
\n\
Output is JSON on stdout; logs go to stderr (filter with SPOTLINK_LOG)."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-attempt request timeout in milliseconds.
    ///
    /// Overrides SPOTLINK_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log retries, cache hits and failures at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Append activity records (retries, waits, failures) to this JSON-lines file.
    ///
    /// Overrides SPOTLINK_ACTIVITY_LOG.
    #[arg(long, global = true, value_name = "PATH")]
    pub activity_log: Option<PathBuf>,

    /// Make a single attempt per request instead of retrying.
    #[arg(long, global = true, default_value_t = false)]
    pub no_retry: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the last price for an asset.
    ///
    /// # Examples
    ///
    ///   spotlink price bitcoin
    ///   spotlink price ETHUSDT --pretty
    Price(NameArgs),

    /// Fetch 24 hour rolling statistics for an asset.
    ///
    /// The exchange payload is passed through unchanged.
    Ticker(NameArgs),

    /// Resolve a name to a trading pair without fetching a price.
    Resolve(NameArgs),

    /// Print the records stored in the activity log, oldest first.
    Activity(ActivityArgs),
}

/// Asset argument shared by every command.
#[derive(Debug, Args)]
pub struct NameArgs {
    /// Friendly name, base asset or full pair (e.g. bitcoin, eth, SOLUSDT).
    pub name: String,
}

/// Arguments for the `activity` command.
#[derive(Debug, Args)]
pub struct ActivityArgs {
    /// Only the most recent records.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "spotlink",
            "price",
            "btc",
            "--pretty",
            "--timeout-ms",
            "250",
        ])
        .expect("parses");
        assert!(cli.pretty);
        assert_eq!(cli.timeout_ms, Some(250));
        assert!(matches!(cli.command, Command::Price(NameArgs { ref name }) if name == "btc"));
    }

    #[test]
    fn activity_log_and_no_retry_are_global() {
        let cli = Cli::try_parse_from([
            "spotlink",
            "activity",
            "--limit",
            "5",
            "--activity-log",
            "/tmp/activity.log",
            "--no-retry",
        ])
        .expect("parses");
        assert_eq!(cli.activity_log, Some(PathBuf::from("/tmp/activity.log")));
        assert!(cli.no_retry);
        assert!(matches!(cli.command, Command::Activity(ActivityArgs { limit: Some(5) })));
    }

    #[test]
    fn name_is_required() {
        assert!(Cli::try_parse_from(["spotlink", "ticker"]).is_err());
    }
}
