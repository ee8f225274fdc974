//! Ledger: the authoritative record of cash and executed trades.
//!
//! Holdings are always derived from the transaction log on demand, so they
//! can never drift from it. Validation lives in the settlement engine; the
//! ledger only reads and appends.

use std::sync::Arc;

use crate::domain::error::PapertradeError;
use crate::domain::money::round_cents;
use crate::domain::transaction::{Holding, NewTransaction, Transaction};
use crate::ports::quote_port::QuoteOracle;
use crate::ports::store_port::StorePort;

/// One priced position in a portfolio view.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionView {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    /// Live price at view time.
    pub price: f64,
    /// shares × price, cents-rounded.
    pub value: f64,
}

/// A user's portfolio priced at live quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub positions: Vec<PositionView>,
    pub cash: f64,
    /// cash plus the market value of all positions.
    pub total: f64,
}

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn StorePort + Send + Sync>,
}

impl Ledger {
    pub fn new(store: Arc<dyn StorePort + Send + Sync>) -> Self {
        Self { store }
    }

    pub fn cash(&self, user_id: i64) -> Result<f64, PapertradeError> {
        self.store.cash(user_id)
    }

    /// Overwrite the cash balance. Negative balances are rejected here
    /// rather than trusted to callers.
    pub fn set_cash(&self, user_id: i64, amount: f64) -> Result<(), PapertradeError> {
        if amount < 0.0 {
            return Err(PapertradeError::invalid_input(format!(
                "cash balance cannot be negative (got {amount:.2})"
            )));
        }
        self.store.set_cash(user_id, round_cents(amount))
    }

    pub fn transactions(&self, user_id: i64) -> Result<Vec<Transaction>, PapertradeError> {
        self.store.transactions(user_id)
    }

    pub fn net_shares(&self, user_id: i64, symbol: &str) -> Result<i64, PapertradeError> {
        self.store.net_shares(user_id, symbol)
    }

    pub fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, PapertradeError> {
        self.store.holdings(user_id)
    }

    /// Append a transaction without validation.
    pub fn record(&self, user_id: i64, tx: &NewTransaction) -> Result<i64, PapertradeError> {
        self.store.record_transaction(user_id, tx)
    }

    /// Price every current holding at a fresh quote and total up the
    /// portfolio. Fails if the oracle no longer knows a held symbol.
    pub fn portfolio(
        &self,
        user_id: i64,
        oracle: &dyn QuoteOracle,
    ) -> Result<PortfolioView, PapertradeError> {
        let cash = self.store.cash(user_id)?;
        let mut positions = Vec::new();
        let mut total = cash;

        for holding in self.store.holdings(user_id)? {
            let quote = oracle.lookup(&holding.symbol)?.ok_or_else(|| {
                PapertradeError::SymbolNotFound {
                    symbol: holding.symbol.clone(),
                }
            })?;
            let value = round_cents(holding.shares as f64 * quote.price);
            total += value;
            positions.push(PositionView {
                symbol: holding.symbol,
                name: quote.name,
                shares: holding.shares,
                price: quote.price,
                value,
            });
        }

        Ok(PortfolioView {
            positions,
            cash,
            total: round_cents(total),
        })
    }
}
