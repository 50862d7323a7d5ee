mod activity;
mod price;
mod resolve;
mod ticker;

use serde_json::Value;
use spotlink_core::{CancellationToken, MarketDataClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn new(data: Value, cache_hit: bool) -> Self {
        Self { data, cache_hit }
    }
}

pub async fn run(
    cli: &Cli,
    client: &MarketDataClient,
    cancel: &CancellationToken,
) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Price(args) => price::run(args, client, cancel).await,
        Command::Ticker(args) => ticker::run(args, client, cancel).await,
        Command::Resolve(args) => resolve::run(args, client, cancel).await,
        Command::Activity(args) => activity::run(args, client),
    }
}

pub fn name(command: &Command) -> &'static str {
    match command {
        Command::Price(_) => "price",
        Command::Ticker(_) => "ticker",
        Command::Resolve(_) => "resolve",
        Command::Activity(_) => "activity",
    }
}
