use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Quote currency every heuristic pairs against.
pub const QUOTE_ASSET: &str = "USDT";

/// Canonical exchange trading pair, e.g. `BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TradingPair(String);

impl TradingPair {
    /// Normalizes to uppercase and checks the character set.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let normalized = trimmed.to_uppercase();
        if !normalized.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidPair { value: normalized });
        }

        Ok(Self(normalized))
    }

    /// Wraps a symbol already confirmed by the exchange symbol set.
    pub(crate) fn from_validated(symbol: String) -> Self {
        Self(symbol.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_quote_suffix(&self) -> bool {
        self.0.ends_with(QUOTE_ASSET)
    }
}

impl Display for TradingPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TradingPair {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TradingPair> for String {
    fn from(value: TradingPair) -> Self {
        value.0
    }
}

impl AsRef<str> for TradingPair {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Lower-cased common names and tickers mapped to their trading pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyNames {
    entries: HashMap<String, String>,
}

const DEFAULT_FRIENDLY_NAMES: &[(&str, &str)] = &[
    ("bitcoin", "BTCUSDT"),
    ("btc", "BTCUSDT"),
    ("ethereum", "ETHUSDT"),
    ("eth", "ETHUSDT"),
    ("bnb", "BNBUSDT"),
    ("binancecoin", "BNBUSDT"),
    ("litecoin", "LTCUSDT"),
    ("ltc", "LTCUSDT"),
    ("dogecoin", "DOGEUSDT"),
    ("doge", "DOGEUSDT"),
];

impl Default for FriendlyNames {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_FRIENDLY_NAMES.iter().copied())
    }
}

impl FriendlyNames {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(alias, symbol)| (alias.to_lowercase(), symbol.to_uppercase()))
                .collect(),
        }
    }

    /// The built-in table, shared.
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<FriendlyNames> = OnceLock::new();
        BUILTIN.get_or_init(Self::default)
    }

    /// Looks up an already lower-cased, trimmed alias.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Structural guesses for a raw input, in the order they are tried.
///
/// The input is expected trimmed and upper-cased.
pub fn structural_candidates(raw_upper: &str) -> Vec<String> {
    let mut candidates = vec![raw_upper.to_owned()];
    if let Some(base) = raw_upper.strip_suffix(QUOTE_ASSET) {
        if !base.is_empty() {
            candidates.push(base.to_owned());
        }
    } else {
        candidates.push(format!("{raw_upper}{QUOTE_ASSET}"));
    }
    candidates
}

/// Last-resort guess: title-case each word, join, and pair with the quote asset.
///
/// The input is expected lower-cased. Only the first character of each word
/// changes; the rest is kept as given.
pub fn title_case_candidate(lower: &str) -> String {
    let mut joined = String::with_capacity(lower.len() + QUOTE_ASSET.len());
    for word in lower.split_whitespace() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            joined.extend(first.to_uppercase());
            joined.push_str(chars.as_str());
        }
    }
    joined.push_str(QUOTE_ASSET);
    joined
}
