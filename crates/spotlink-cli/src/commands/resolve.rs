use serde::Serialize;
use spotlink_core::{CancellationToken, MarketDataClient, TradingPair};

use crate::cli::NameArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ResolveResponseData<'a> {
    input: &'a str,
    symbol: TradingPair,
}

pub async fn run(
    args: &NameArgs,
    client: &MarketDataClient,
    cancel: &CancellationToken,
) -> Result<CommandResult, CliError> {
    let symbol = client.resolve(&args.name, cancel).await?;
    let data = serde_json::to_value(ResolveResponseData {
        input: &args.name,
        symbol,
    })?;
    // Exchange-info hits are not reported per call.
    Ok(CommandResult::new(data, false))
}
