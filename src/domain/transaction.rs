//! Transaction log types.

use chrono::NaiveDateTime;

/// An executed trade as stored in the ledger. Immutable once recorded;
/// the log is append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    /// Company name snapshot taken from the quote at execution time.
    pub company: String,
    /// Signed share count: positive = buy, negative = sell.
    pub shares: i64,
    /// Unit price at execution time.
    pub price: f64,
    /// shares × price, cents-rounded.
    pub total: f64,
    pub executed_at: NaiveDateTime,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.shares > 0
    }
}

/// A trade about to be recorded, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub symbol: String,
    pub company: String,
    pub shares: i64,
    pub price: f64,
    pub total: f64,
    pub executed_at: NaiveDateTime,
}

/// Net shares currently owned for one symbol, derived from the transaction
/// log. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub company: String,
    pub shares: i64,
}
