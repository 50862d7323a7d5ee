use spotlink_core::{CancellationToken, MarketDataClient};

use crate::cli::NameArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &NameArgs,
    client: &MarketDataClient,
    cancel: &CancellationToken,
) -> Result<CommandResult, CliError> {
    let ticker = client.get_24hr(&args.name, cancel).await?;
    let cache_hit = ticker.cached;
    Ok(CommandResult::new(serde_json::to_value(ticker)?, cache_hit))
}
