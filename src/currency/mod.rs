use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

/// Pure currency conversion consumed by the store when building reports.
pub trait CurrencyConverter: Send + Sync {
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal;
}

/// Converter for single-currency ledgers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl CurrencyConverter for IdentityConverter {
    fn convert(&self, amount: Decimal, _from: &str, _to: &str) -> Decimal {
        amount
    }
}

/// Static table of rates expressed as "one unit of the currency in pivot units".
///
/// Unknown currencies convert at par.
#[derive(Debug, Clone)]
pub struct RateTable {
    pivot: String,
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn new(pivot: impl Into<String>) -> Self {
        let pivot = normalize(&pivot.into());
        let mut rates = HashMap::new();
        rates.insert(pivot.clone(), Decimal::ONE);
        Self { pivot, rates }
    }

    pub fn with_rate(mut self, currency: &str, rate: Decimal) -> Self {
        self.set_rate(currency, rate);
        self
    }

    pub fn set_rate(&mut self, currency: &str, rate: Decimal) {
        if rate > Decimal::ZERO {
            self.rates.insert(normalize(currency), rate);
        }
    }

    pub fn pivot(&self) -> &str {
        &self.pivot
    }

    fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(&normalize(currency)).copied()
    }
}

impl CurrencyConverter for RateTable {
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        if normalize(from) == normalize(to) {
            return amount;
        }
        match (self.rate(from), self.rate(to)) {
            (Some(from_rate), Some(to_rate)) => (amount * from_rate / to_rate)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            _ => {
                tracing::warn!(from, to, "missing exchange rate, converting at par");
                amount
            }
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
