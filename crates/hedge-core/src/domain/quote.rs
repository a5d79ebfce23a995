use std::fmt::{Display, Formatter};
use std::str::FromStr;

use hedge_warehouse::{DollarQuoteRecord, StoredDollarQuote};
use serde::{Deserialize, Serialize};

use crate::{ProviderId, ValidationError};

/// Currency pair in `BASE-QUOTE` form, for example `USD-BRL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct CurrencyPair {
    base: String,
    quote: String,
}

impl CurrencyPair {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidCurrencyPair {
            value: input.to_owned(),
        };

        let (base, quote) = input.trim().split_once('-').ok_or_else(invalid)?;
        let base = currency_code(base).ok_or_else(invalid)?;
        let quote = currency_code(quote).ok_or_else(invalid)?;

        Ok(Self { base, quote })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self {
            base: String::from("USD"),
            quote: String::from("BRL"),
        }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl From<CurrencyPair> for String {
    fn from(value: CurrencyPair) -> Self {
        value.to_string()
    }
}

fn currency_code(input: &str) -> Option<String> {
    let normalized = input.to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());
    is_valid.then_some(normalized)
}

/// Exchange-rate snapshot as published upstream.
///
/// Numeric fields stay as the upstream strings so nothing is lost to float
/// rounding between the provider and the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DollarQuote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

impl DollarQuote {
    pub fn to_record(&self, source: ProviderId) -> DollarQuoteRecord {
        DollarQuoteRecord {
            code: self.code.clone(),
            codein: self.codein.clone(),
            name: self.name.clone(),
            high: self.high.clone(),
            low: self.low.clone(),
            var_bid: self.var_bid.clone(),
            pct_change: self.pct_change.clone(),
            bid: self.bid.clone(),
            ask: self.ask.clone(),
            upstream_timestamp: self.timestamp.clone(),
            create_date: self.create_date.clone(),
            source: source.as_str().to_owned(),
        }
    }
}

impl From<StoredDollarQuote> for DollarQuote {
    fn from(stored: StoredDollarQuote) -> Self {
        let record = stored.record;
        Self {
            code: record.code,
            codein: record.codein,
            name: record.name,
            high: record.high,
            low: record.low,
            var_bid: record.var_bid,
            pct_change: record.pct_change,
            bid: record.bid,
            ask: record.ask,
            timestamp: record.upstream_timestamp,
            create_date: record.create_date,
        }
    }
}
