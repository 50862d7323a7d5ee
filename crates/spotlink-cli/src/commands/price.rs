use spotlink_core::{CancellationToken, MarketDataClient};

use crate::cli::NameArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &NameArgs,
    client: &MarketDataClient,
    cancel: &CancellationToken,
) -> Result<CommandResult, CliError> {
    let quote = client.get_price(&args.name, cancel).await?;
    let cache_hit = quote.cached;
    Ok(CommandResult::new(serde_json::to_value(quote)?, cache_hit))
}
