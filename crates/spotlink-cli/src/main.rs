mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use spotlink_core::{
    ActivityLog, CancellationToken, ClientConfig, FanoutActivityLog, JsonLinesActivityLog,
    MarketDataClient, RetryPolicy, TracingActivityLog,
};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::metadata::{Metadata, RequestId};

const LOG_ENV: &str = "SPOTLINK_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let request_id = RequestId::new_v4();
    match run(&cli, request_id).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            if let Err(render_error) = output::render_error(request_id, &error, cli.pretty) {
                eprintln!("error: {render_error}");
            }
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli, request_id: RequestId) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env();
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_request_timeout(Duration::from_millis(timeout_ms));
    }
    if cli.no_retry {
        config = config.with_retry(RetryPolicy::no_retry());
    }
    if let Some(path) = &cli.activity_log {
        config = config.with_activity_log_path(path);
    }

    let activity = activity_log(&config)?;
    let client = MarketDataClient::builder(config)
        .activity_log(activity)
        .build();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight request");
            interrupt.cancel();
        }
    });

    let command = commands::name(&cli.command);
    tracing::debug!(%request_id, command, "running command");

    let started = Instant::now();
    let result = commands::run(cli, &client, &cancel).await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let meta = Metadata::new(request_id, command, latency_ms, result.cache_hit);
    output::render(&meta, &result.data, cli.pretty)
}

/// Tracing always, plus the JSON-lines file when one is configured.
fn activity_log(config: &ClientConfig) -> Result<Arc<dyn ActivityLog>, CliError> {
    let Some(path) = &config.activity_log_path else {
        return Ok(Arc::new(TracingActivityLog));
    };

    let file = JsonLinesActivityLog::open(path)?;
    tracing::debug!(path = %path.display(), "appending activity records");
    Ok(Arc::new(
        FanoutActivityLog::new()
            .with_sink(Arc::new(TracingActivityLog))
            .with_sink(Arc::new(file)),
    ))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
