//! # Spotlink Core
//!
//! Resilient access to spot market data: free-text asset names in,
//! validated trading pairs and prices out.
//!
//! ## Overview
//!
//! - **Symbol resolution** with an ordered fallback chain
//!   (friendly names, structural guesses, title-cased fallback)
//! - **Resilient fetching** with bounded retries, exponential backoff and
//!   `Retry-After` cooperation
//! - **TTL caching** shared by every lookup kind, with reader-chosen lifetimes
//! - **Structured activity records** for every retry and failure, optionally
//!   appended to a JSON-lines file
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`activity`] | Activity log contract and sinks |
//! | [`cache`] | TTL cache |
//! | [`clock`] | Injectable time sources |
//! | [`config`] | Hosts, timeouts, retry budget, cache lifetimes |
//! | [`error`] | Error types and classification |
//! | [`fetcher`] | Retrying request executor |
//! | [`http_client`] | Single-shot HTTP transport abstraction |
//! | [`market`] | `get_price` / `get_24hr` |
//! | [`resolver`] | Symbol resolution and validation |
//! | [`retry`] | Retry policy and backoff |
//! | [`symbol`] | Trading pair type and candidate heuristics |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spotlink_core::{ClientConfig, MarketDataClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketDataClient::new(ClientConfig::from_env());
//!     let cancel = CancellationToken::new();
//!
//!     let quote = client.get_price("bitcoin", &cancel).await?;
//!     println!("{}: {} (cached: {})", quote.symbol, quote.price, quote.cached);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ MarketDataClient │
//! └────────┬─────────┘
//!          │ resolve(name)
//!          ▼
//! ┌──────────────────┐     ┌───────────────────┐
//! │  SymbolResolver  │────▶│ ExchangeValidator │──┐
//! └──────────────────┘     └───────────────────┘  │
//!          │                                      │
//!          ▼                                      ▼
//! ┌──────────────────┐     ┌───────────────────┐
//! │     TtlCache     │◀────│      Fetcher      │
//! └──────────────────┘     └─────────┬─────────┘
//!                                    ▼
//!                          ┌───────────────────┐
//!                          │    HttpClient     │
//!                          └───────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use spotlink_core::{ErrorClass, MarketDataError};
//!
//! fn handle(error: &MarketDataError) -> &'static str {
//!     match error.class() {
//!         ErrorClass::Transient => "upstream is struggling, try again later",
//!         ErrorClass::Terminal => "check the request",
//!     }
//! }
//!
//! let error = MarketDataError::UnresolvedSymbol { input: "zzz".into() };
//! assert_eq!(handle(&error), "check the request");
//! ```

pub mod activity;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod market;
pub mod resolver;
pub mod retry;
pub mod symbol;

pub use activity::{
    ActivityLevel, ActivityLog, ActivityRecord, FanoutActivityLog, JsonLinesActivityLog,
    MemoryActivityLog, TracingActivityLog,
};
pub use cache::{CachedValue, MarketCache, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheTtls, ClientConfig};
pub use error::{ErrorClass, MarketDataError, ValidationError};
pub use fetcher::Fetcher;
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use market::{MarketDataClient, MarketDataClientBuilder, PriceQuote, Ticker24h};
pub use resolver::{
    ExchangeValidator, StaticSymbolSet, SymbolResolver, SymbolValidator, ValidationFuture,
    EXCHANGE_INFO_CACHE_KEY,
};
pub use retry::{parse_retry_after, RetryPolicy};
pub use symbol::{FriendlyNames, TradingPair, QUOTE_ASSET};

pub use tokio_util::sync::CancellationToken;
