use serde::Serialize;
use serde_json::Value;
use spotlink_core::{JsonLinesActivityLog, MarketDataClient};

use crate::cli::ActivityArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ActivityResponseData {
    path: String,
    records: Vec<Value>,
}

pub fn run(args: &ActivityArgs, client: &MarketDataClient) -> Result<CommandResult, CliError> {
    let path = client
        .config()
        .activity_log_path
        .as_deref()
        .ok_or(CliError::ActivityLogNotConfigured)?;

    let mut records = JsonLinesActivityLog::read_records(path)?;
    if let Some(limit) = args.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    let data = serde_json::to_value(ActivityResponseData {
        path: path.display().to_string(),
        records,
    })?;
    Ok(CommandResult::new(data, false))
}
