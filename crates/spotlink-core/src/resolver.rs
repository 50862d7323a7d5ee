//! Symbol resolution: free text in, validated trading pair out.
//!
//! Strategies are tried in a fixed order and the first candidate the
//! validator accepts wins:
//!
//! 1. friendly-name table (`"bitcoin"` -> `BTCUSDT`)
//! 2. structural guesses on the upper-cased input: as given, with `USDT`
//!    appended, or with a trailing `USDT` removed. A bare candidate that
//!    validates is upgraded to its `USDT` form when that validates too.
//! 3. title-cased words joined and suffixed with `USDT`
//!
//! Validation is a seam ([`SymbolValidator`]); [`ExchangeValidator`] checks
//! against the exchange-wide symbol set, fetched once and cached.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityLog, ActivityRecord};
use crate::cache::{CachedValue, MarketCache};
use crate::error::{MarketDataError, ValidationError};
use crate::fetcher::Fetcher;
use crate::http_client::HttpRequest;
use crate::symbol::{
    structural_candidates, title_case_candidate, FriendlyNames, TradingPair, QUOTE_ASSET,
};

/// Cache key of the exchange-wide symbol set.
pub const EXCHANGE_INFO_CACHE_KEY: &str = "exchange_info_all";

pub type ValidationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<bool, MarketDataError>> + Send + 'a>>;

/// Confirms that a candidate symbol is tradeable.
///
/// `Ok(false)` rejects just this candidate. An `Err` aborts resolution.
pub trait SymbolValidator: Send + Sync {
    fn validate_exists<'a>(
        &'a self,
        symbol: &'a str,
        cancel: &'a CancellationToken,
    ) -> ValidationFuture<'a>;
}

/// Validator backed by a fixed symbol set, for offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticSymbolSet {
    symbols: HashSet<String>,
}

impl StaticSymbolSet {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|symbol| symbol.as_ref().to_uppercase())
                .collect(),
        }
    }
}

impl SymbolValidator for StaticSymbolSet {
    fn validate_exists<'a>(
        &'a self,
        symbol: &'a str,
        _cancel: &'a CancellationToken,
    ) -> ValidationFuture<'a> {
        let exists = self.symbols.contains(&symbol.to_uppercase());
        Box::pin(async move { Ok(exists) })
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    #[serde(default)]
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
struct ExchangeSymbol {
    #[serde(default)]
    symbol: String,
}

/// Validates against `GET /api/v3/exchangeInfo`, cached for `ttl`.
#[derive(Clone)]
pub struct ExchangeValidator {
    fetcher: Fetcher,
    cache: MarketCache,
    activity: Arc<dyn ActivityLog>,
    url: String,
    timeout: Duration,
    ttl: Duration,
}

impl ExchangeValidator {
    pub fn new(
        fetcher: Fetcher,
        cache: MarketCache,
        activity: Arc<dyn ActivityLog>,
        url: impl Into<String>,
        timeout: Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            activity,
            url: url.into(),
            timeout,
            ttl,
        }
    }

    /// The cached symbol set, fetched on a miss.
    ///
    /// `None` means the exchange answered with a non-success status.
    pub async fn symbol_set(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<HashSet<String>>>, MarketDataError> {
        if let Some(CachedValue::SymbolSet(symbols)) =
            self.cache.get(EXCHANGE_INFO_CACHE_KEY, self.ttl).await
        {
            return Ok(Some(symbols));
        }

        let request = HttpRequest::get(self.url.as_str()).with_timeout(self.timeout);
        let response = self.fetcher.fetch(request, cancel).await?;
        if response.status != 200 {
            self.activity.record(ActivityRecord::error(format!(
                "Failed to fetch exchangeInfo: {} {}",
                response.status, response.body
            )));
            return Ok(None);
        }

        let info: ExchangeInfo = serde_json::from_str(&response.body).map_err(|e| {
            self.activity.record(
                ActivityRecord::error("exchangeInfo payload could not be parsed")
                    .with_extra("error", e.to_string()),
            );
            MarketDataError::decode(format!("exchangeInfo: {e}"))
        })?;
        let symbols: Arc<HashSet<String>> = Arc::new(
            info.symbols
                .into_iter()
                .map(|entry| entry.symbol.to_uppercase())
                .collect(),
        );
        self.cache
            .set(EXCHANGE_INFO_CACHE_KEY, CachedValue::SymbolSet(symbols.clone()))
            .await;
        Ok(Some(symbols))
    }
}

impl SymbolValidator for ExchangeValidator {
    fn validate_exists<'a>(
        &'a self,
        symbol: &'a str,
        cancel: &'a CancellationToken,
    ) -> ValidationFuture<'a> {
        Box::pin(async move {
            let symbol = symbol.to_uppercase();
            let symbols = self.symbol_set(cancel).await?;
            Ok(symbols.is_some_and(|set| set.contains(&symbol)))
        })
    }
}

/// Ordered-fallback resolver.
#[derive(Clone)]
pub struct SymbolResolver {
    validator: Arc<dyn SymbolValidator>,
    names: FriendlyNames,
}

impl SymbolResolver {
    pub fn new(validator: Arc<dyn SymbolValidator>) -> Self {
        Self::with_names(validator, FriendlyNames::builtin().clone())
    }

    pub fn with_names(validator: Arc<dyn SymbolValidator>, names: FriendlyNames) -> Self {
        Self { validator, names }
    }

    pub async fn resolve(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<TradingPair, MarketDataError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let lower = trimmed.to_lowercase();
        if let Some(mapped) = self.names.get(&lower) {
            if self.is_valid(mapped, cancel).await? {
                return Ok(TradingPair::from_validated(mapped.to_owned()));
            }
        }

        for candidate in structural_candidates(&trimmed.to_uppercase()) {
            if !self.is_valid(&candidate, cancel).await? {
                continue;
            }
            if candidate.ends_with(QUOTE_ASSET) {
                return Ok(TradingPair::from_validated(candidate));
            }
            // Prefer the quoted pair, but keep the bare symbol when only it exists.
            let quoted = format!("{candidate}{QUOTE_ASSET}");
            if self.is_valid(&quoted, cancel).await? {
                return Ok(TradingPair::from_validated(quoted));
            }
            return Ok(TradingPair::from_validated(candidate));
        }

        let fallback = title_case_candidate(&lower);
        if self.is_valid(&fallback, cancel).await? {
            return Ok(TradingPair::from_validated(fallback));
        }

        Err(MarketDataError::UnresolvedSymbol {
            input: name.to_owned(),
        })
    }

    async fn is_valid(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, MarketDataError> {
        self.validator.validate_exists(symbol, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Static set that also records every candidate it was asked about.
    struct RecordingValidator {
        inner: StaticSymbolSet,
        asked: Mutex<Vec<String>>,
    }

    impl RecordingValidator {
        fn new(symbols: &[&str]) -> Self {
            Self {
                inner: StaticSymbolSet::new(symbols.iter().copied()),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<String> {
            self.asked
                .lock()
                .expect("recording lock should not be poisoned")
                .clone()
        }
    }

    impl SymbolValidator for RecordingValidator {
        fn validate_exists<'a>(
            &'a self,
            symbol: &'a str,
            cancel: &'a CancellationToken,
        ) -> ValidationFuture<'a> {
            self.asked
                .lock()
                .expect("recording lock should not be poisoned")
                .push(symbol.to_owned());
            self.inner.validate_exists(symbol, cancel)
        }
    }

    async fn resolve_with(symbols: &[&str], name: &str) -> Result<TradingPair, MarketDataError> {
        let resolver = SymbolResolver::new(Arc::new(StaticSymbolSet::new(symbols.iter().copied())));
        resolver.resolve(name, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn friendly_name_is_tried_first() {
        let validator = Arc::new(RecordingValidator::new(&["BTCUSDT"]));
        let resolver = SymbolResolver::new(validator.clone());

        let pair = resolver
            .resolve("Bitcoin", &CancellationToken::new())
            .await
            .expect("bitcoin resolves");

        assert_eq!(pair.as_str(), "BTCUSDT");
        assert_eq!(validator.asked(), vec!["BTCUSDT"]);
    }

    #[tokio::test]
    async fn empty_input_fails_without_validation() {
        let validator = Arc::new(RecordingValidator::new(&["BTCUSDT"]));
        let resolver = SymbolResolver::new(validator.clone());

        let error = resolver
            .resolve("   ", &CancellationToken::new())
            .await
            .expect_err("blank input");

        assert_eq!(error, MarketDataError::Validation(ValidationError::EmptyName));
        assert!(validator.asked().is_empty());
    }

    #[tokio::test]
    async fn bare_symbol_is_kept_when_quoted_form_is_unknown() {
        let pair = resolve_with(&["WBTC"], "wbtc").await.expect("bare symbol");
        assert_eq!(pair.as_str(), "WBTC");
    }

    #[tokio::test]
    async fn stripped_base_is_upgraded_back_to_pair() {
        // Input's own pair is unknown but the stripped base validates; its
        // quoted form is the input again and is rejected, so the base wins.
        let pair = resolve_with(&["SOL"], "solusdt").await.expect("base symbol");
        assert_eq!(pair.as_str(), "SOL");
    }

    #[tokio::test]
    async fn appended_quote_is_tried_after_raw_input() {
        let validator = Arc::new(RecordingValidator::new(&["SOLUSDT"]));
        let resolver = SymbolResolver::new(validator.clone());

        let pair = resolver
            .resolve("sol", &CancellationToken::new())
            .await
            .expect("sol resolves");

        assert_eq!(pair.as_str(), "SOLUSDT");
        assert_eq!(validator.asked(), vec!["SOL", "SOLUSDT"]);
    }

    #[tokio::test]
    async fn multi_word_names_fall_back_to_joined_title_case() {
        let validator = Arc::new(RecordingValidator::new(&["SHIBAINUUSDT"]));
        let resolver = SymbolResolver::new(validator.clone());

        let pair = resolver
            .resolve("shiba inu", &CancellationToken::new())
            .await
            .expect("fallback resolves");

        assert_eq!(pair.as_str(), "SHIBAINUUSDT");
        assert_eq!(
            validator.asked(),
            vec!["SHIBA INU", "SHIBA INUUSDT", "ShibaInuUSDT"]
        );
    }

    #[tokio::test]
    async fn unresolved_error_keeps_original_input() {
        let error = resolve_with(&[], " Nope ").await.expect_err("nothing validates");
        assert_eq!(
            error,
            MarketDataError::UnresolvedSymbol {
                input: String::from(" Nope "),
            }
        );
    }
}
