use serde::Serialize;
use spotlink_core::{ErrorClass, MarketDataError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("no activity log configured; pass --activity-log or set SPOTLINK_ACTIVITY_LOG")]
    ActivityLogNotConfigured,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Machine-readable error body printed on stdout.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'a str,
    pub message: String,
    pub retryable: bool,
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MarketData(MarketDataError::Validation(_)) => 2,
            Self::ActivityLogNotConfigured => 2,
            Self::MarketData(MarketDataError::UnresolvedSymbol { .. }) => 3,
            Self::MarketData(error) if error.class() == ErrorClass::Transient => 4,
            Self::MarketData(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }

    pub fn body(&self) -> ErrorBody<'_> {
        match self {
            Self::MarketData(error) => ErrorBody {
                code: error.code(),
                message: error.to_string(),
                retryable: error.retryable(),
            },
            Self::ActivityLogNotConfigured => ErrorBody {
                code: "cli.activity_log",
                message: self.to_string(),
                retryable: false,
            },
            Self::Serialization(error) => ErrorBody {
                code: "cli.serialization",
                message: error.to_string(),
                retryable: false,
            },
            Self::Io(error) => ErrorBody {
                code: "cli.io",
                message: error.to_string(),
                retryable: false,
            },
        }
    }
}
