//! Market data operations exposed to callers.
//!
//! | Operation | Upstream | Cache key | TTL |
//! |-----------|----------|-----------|-----|
//! | [`MarketDataClient::get_price`] | `{primary}/api/v3/ticker/price` | `price::{SYMBOL}` | 5 s |
//! | [`MarketDataClient::get_24hr`] | `{data}/api/v3/ticker/24hr` | `24hr::{SYMBOL}` | 10 s |
//!
//! Both resolve the caller's name first, so they fail with the resolver's
//! error for unknown assets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityLog, ActivityRecord, TracingActivityLog};
use crate::cache::{CachedValue, MarketCache, TtlCache};
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::error::MarketDataError;
use crate::fetcher::Fetcher;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::resolver::{ExchangeValidator, SymbolResolver, SymbolValidator};
use crate::symbol::TradingPair;

const EXCHANGE_INFO_PATH: &str = "/api/v3/exchangeInfo";
const TICKER_PRICE_PATH: &str = "/api/v3/ticker/price";
const TICKER_24HR_PATH: &str = "/api/v3/ticker/24hr";

/// Result of [`MarketDataClient::get_price`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: TradingPair,
    /// Decimal as sent by the exchange.
    pub price: String,
    pub cached: bool,
}

/// Result of [`MarketDataClient::get_24hr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker24h {
    pub symbol: TradingPair,
    pub data: Value,
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Option<String>,
}

/// Resolver, fetcher and cache wired together.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct MarketDataClient {
    config: Arc<ClientConfig>,
    fetcher: Fetcher,
    resolver: SymbolResolver,
    cache: MarketCache,
    activity: Arc<dyn ActivityLog>,
}

impl MarketDataClient {
    /// Production client: reqwest transport, tracing activity log, system clock.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> MarketDataClientBuilder {
        MarketDataClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &MarketCache {
        &self.cache
    }

    /// Resolves `name` to a validated trading pair, logging failures.
    pub async fn resolve(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<TradingPair, MarketDataError> {
        self.resolver.resolve(name, cancel).await.map_err(|error| {
            self.activity.record(
                ActivityRecord::error(format!("resolve_symbol failed: {error}"))
                    .with_extra("input", name),
            );
            error
        })
    }

    /// Last price for `name`, served from cache when fetched within the price TTL.
    pub async fn get_price(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<PriceQuote, MarketDataError> {
        let symbol = self.resolve(name, cancel).await?;
        let cache_key = format!("price::{symbol}");

        if let Some(CachedValue::Price(price)) =
            self.cache.get(&cache_key, self.config.ttls.price).await
        {
            self.activity
                .record(ActivityRecord::debug(format!("cache hit for price {symbol}")));
            return Ok(PriceQuote {
                symbol,
                price,
                cached: true,
            });
        }

        let url = self.config.primary_url(TICKER_PRICE_PATH);
        let body = self.fetch_success(&url, &symbol, "get_price", cancel).await?;
        let price = serde_json::from_str::<TickerPrice>(&body)
            .ok()
            .and_then(|payload| payload.price)
            .ok_or_else(|| {
                self.activity.record(
                    ActivityRecord::error(format!("get_price returned no price for {symbol}"))
                        .with_extra("body", body.as_str()),
                );
                MarketDataError::decode(format!("ticker/price for {symbol} has no price field"))
            })?;

        self.cache
            .set(cache_key, CachedValue::Price(price.clone()))
            .await;
        self.activity.record(
            ActivityRecord::info(format!("Fetched price for {symbol}"))
                .with_extra("price", price.as_str()),
        );
        Ok(PriceQuote {
            symbol,
            price,
            cached: false,
        })
    }

    /// 24 hour statistics for `name`, served from cache within the ticker TTL.
    pub async fn get_24hr(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Ticker24h, MarketDataError> {
        let symbol = self.resolve(name, cancel).await?;
        let cache_key = format!("24hr::{symbol}");

        if let Some(CachedValue::Ticker(data)) =
            self.cache.get(&cache_key, self.config.ttls.ticker_24h).await
        {
            self.activity
                .record(ActivityRecord::debug(format!("cache hit for 24hr {symbol}")));
            return Ok(Ticker24h {
                symbol,
                data,
                cached: true,
            });
        }

        let url = self.config.data_url(TICKER_24HR_PATH);
        let body = self.fetch_success(&url, &symbol, "get_24hr", cancel).await?;
        let data: Value = serde_json::from_str(&body).map_err(|e| {
            self.activity.record(
                ActivityRecord::error(format!("get_24hr payload for {symbol} is not JSON"))
                    .with_extra("error", e.to_string()),
            );
            MarketDataError::decode(format!("ticker/24hr for {symbol}: {e}"))
        })?;

        self.cache
            .set(cache_key, CachedValue::Ticker(data.clone()))
            .await;
        self.activity
            .record(ActivityRecord::info(format!("Fetched 24hr ticker for {symbol}")));
        Ok(Ticker24h {
            symbol,
            data,
            cached: false,
        })
    }

    /// GET `url?symbol=...`; any status other than 200 becomes `Upstream`.
    async fn fetch_success(
        &self,
        url: &str,
        symbol: &TradingPair,
        operation: &str,
        cancel: &CancellationToken,
    ) -> Result<String, MarketDataError> {
        let request = HttpRequest::get(url)
            .with_param("symbol", symbol.as_str())
            .with_timeout(self.config.request_timeout);
        let full_url = request.full_url();
        let response = self.fetcher.fetch(request, cancel).await?;

        if response.status != 200 {
            self.activity.record(
                ActivityRecord::error(format!("{operation} failed for {symbol}"))
                    .with_extra("status", response.status)
                    .with_extra("body", response.body.as_str()),
            );
            return Err(MarketDataError::Upstream {
                url: full_url,
                status: response.status,
                body: response.body,
            });
        }

        Ok(response.body)
    }
}

/// Swaps out the transport, activity log, clock or validator.
pub struct MarketDataClientBuilder {
    config: ClientConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    activity: Option<Arc<dyn ActivityLog>>,
    clock: Option<Arc<dyn Clock>>,
    validator: Option<Arc<dyn SymbolValidator>>,
}

impl MarketDataClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: None,
            activity: None,
            clock: None,
            validator: None,
        }
    }

    pub fn http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn activity_log(mut self, activity: Arc<dyn ActivityLog>) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the exchange-info validator.
    pub fn validator(mut self, validator: Arc<dyn SymbolValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn build(self) -> MarketDataClient {
        let config = Arc::new(self.config);
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let activity = self
            .activity
            .unwrap_or_else(|| Arc::new(TracingActivityLog));
        let cache = match self.clock {
            Some(clock) => TtlCache::with_clock(clock),
            None => TtlCache::new(),
        };

        let fetcher = Fetcher::new(http_client, config.retry, activity.clone());
        let validator = self.validator.unwrap_or_else(|| {
            Arc::new(ExchangeValidator::new(
                fetcher.clone(),
                cache.clone(),
                activity.clone(),
                config.primary_url(EXCHANGE_INFO_PATH),
                config.request_timeout,
                config.ttls.exchange_info,
            ))
        });

        MarketDataClient {
            resolver: SymbolResolver::new(validator),
            config,
            fetcher,
            cache,
            activity,
        }
    }
}
