//! Currency conversion against a base-currency rate table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Last-resort conversion rate when a currency is in neither the live table nor
/// the fallback table. Aggregation keeps running at degraded accuracy instead of
/// aborting.
pub const FALLBACK_RATE_TO_BASE: Decimal = dec!(1);

/// Exchange rates quoted against a single base currency.
///
/// The record store replaces the whole snapshot atomically on refresh, so a
/// reader never observes a partially updated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    pub base_currency: String,
    /// Units of base currency per one unit of the keyed currency.
    pub rates: HashMap<String, Decimal>,
    /// Per-currency defaults used when the live table lacks a currency.
    #[serde(default)]
    pub fallback_rates: HashMap<String, Decimal>,
    pub refreshed_at: DateTime<Utc>,
}

impl ExchangeRateSnapshot {
    pub fn new(base_currency: &str) -> Self {
        Self {
            base_currency: base_currency.to_string(),
            rates: HashMap::new(),
            fallback_rates: HashMap::new(),
            refreshed_at: Utc::now(),
        }
    }

    pub fn with_rate(mut self, currency: &str, rate: Decimal) -> Self {
        self.rates.insert(currency.to_string(), rate);
        self
    }

    pub fn with_fallback(mut self, currency: &str, rate: Decimal) -> Self {
        self.fallback_rates.insert(currency.to_string(), rate);
        self
    }
}

/// Where a conversion rate came from. Anything but `Table` means the result has
/// degraded accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Table,
    Fallback,
    Default,
}

/// Resolves the rate-to-base for a currency. Non-positive table entries are
/// treated as absent so conversion never divides by zero.
pub fn lookup_rate(currency: &str, rates: &ExchangeRateSnapshot) -> (Decimal, RateSource) {
    if let Some(rate) = rates.rates.get(currency) {
        if *rate > Decimal::ZERO {
            return (*rate, RateSource::Table);
        }
        warn!("Ignoring non-positive rate {} for {}", rate, currency);
    }
    if let Some(rate) = rates.fallback_rates.get(currency) {
        if *rate > Decimal::ZERO {
            warn!("No live rate for {}, using fallback {}", currency, rate);
            return (*rate, RateSource::Fallback);
        }
    }
    warn!(
        "No rate for {}, converting at default rate {}",
        currency, FALLBACK_RATE_TO_BASE
    );
    (FALLBACK_RATE_TO_BASE, RateSource::Default)
}

/// Converts an amount into the base currency. Identity for the base currency.
pub fn to_base(amount: Decimal, currency: &str, rates: &ExchangeRateSnapshot) -> Decimal {
    if currency == rates.base_currency {
        return amount;
    }
    let (rate, source) = lookup_rate(currency, rates);
    let converted = amount * rate;
    debug!(
        "Converted {} {} to {} {} at rate {} ({:?})",
        amount, currency, converted, rates.base_currency, rate, source
    );
    converted
}

/// Converts a base-currency amount into the target currency. Identity for the
/// base currency.
pub fn from_base(amount: Decimal, target_currency: &str, rates: &ExchangeRateSnapshot) -> Decimal {
    if target_currency == rates.base_currency {
        return amount;
    }
    let (rate, source) = lookup_rate(target_currency, rates);
    let converted = amount / rate;
    debug!(
        "Converted {} {} to {} {} at rate {} ({:?})",
        amount, rates.base_currency, converted, target_currency, rate, source
    );
    converted
}
