//! Quote value objects.

use chrono::NaiveDate;

/// A point-in-time price for a symbol, as returned by a quote provider.
/// Ephemeral: a fresh lookup is performed per operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
}

/// A single daily closing price in a symbol's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosingPrice {
    pub date: NaiveDate,
    pub close: f64,
}

/// Canonical ticker form: trimmed, uppercased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
