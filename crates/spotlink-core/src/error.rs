//! Error types and retry classification for spotlink.

use thiserror::Error;

/// Input validation errors raised before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol/name cannot be empty")]
    EmptyName,
    #[error("trading pair '{value}' must be uppercase ASCII alphanumeric")]
    InvalidPair { value: String },
}

/// Classification of a failure for caller-side policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The local retry budget was exhausted on a transient upstream condition.
    /// Trying again later may succeed.
    Transient,
    /// Retrying cannot change the outcome.
    Terminal,
}

/// Errors surfaced by resolution, fetching and the market data client.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarketDataError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every resolution strategy was tried and none validated.
    #[error("could not resolve symbol/name '{input}' to a valid trading pair")]
    UnresolvedSymbol { input: String },

    /// HTTP 429 persisted past the final attempt.
    #[error("rate limited on {url} after {attempts} attempts")]
    RateLimited {
        url: String,
        /// Last `Retry-After` hint in seconds, if the server sent a numeric one.
        retry_after: Option<f64>,
        attempts: u32,
    },

    /// HTTP 5xx persisted past the final attempt.
    #[error("server error {status} on {url} after {attempts} attempts")]
    Server {
        url: String,
        status: u16,
        attempts: u32,
    },

    /// Connection or timeout failure persisted past the final attempt.
    #[error("request to {url} failed after {attempts} attempts: {message}")]
    Network {
        url: String,
        message: String,
        attempts: u32,
    },

    /// Non-success status that is not retried (e.g. 400 for an unknown symbol).
    #[error("upstream returned {status} for {url}: {body}")]
    Upstream {
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected upstream payload: {message}")]
    Decode { message: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl MarketDataError {
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network { .. } => {
                ErrorClass::Transient
            }
            Self::Validation(_)
            | Self::UnresolvedSymbol { .. }
            | Self::Upstream { .. }
            | Self::Decode { .. }
            | Self::Cancelled => ErrorClass::Terminal,
        }
    }

    pub const fn retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Transient)
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "resolve.validation",
            Self::UnresolvedSymbol { .. } => "resolve.unresolved",
            Self::RateLimited { .. } => "fetch.rate_limited",
            Self::Server { .. } => "fetch.server",
            Self::Network { .. } => "fetch.network",
            Self::Upstream { .. } => "fetch.upstream",
            Self::Decode { .. } => "fetch.decode",
            Self::Cancelled => "cancelled",
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
