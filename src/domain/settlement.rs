//! Settlement engine: converts trade requests into ledger mutations.
//!
//! Both operations are validate-first: no row is written and no balance is
//! touched until every check has passed, and the write itself goes through
//! the store's atomic `apply_trade`. A per-user mutex is held across the
//! whole read-validate-write sequence so two concurrent trades for the same
//! user cannot both pass an affordability or holding check against stale
//! state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::error::PapertradeError;
use crate::domain::money::round_cents;
use crate::domain::quote::normalize_symbol;
use crate::domain::transaction::NewTransaction;
use crate::ports::quote_port::QuoteOracle;
use crate::ports::store_port::StorePort;

/// The result of a settled trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    pub symbol: String,
    pub company: String,
    /// Unsigned share count as requested.
    pub shares: i64,
    pub unit_price: f64,
    /// shares × unit_price, cents-rounded.
    pub total: f64,
    pub new_cash: f64,
}

pub struct SettlementEngine {
    store: Arc<dyn StorePort + Send + Sync>,
    oracle: Arc<dyn QuoteOracle + Send + Sync>,
    user_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SettlementEngine {
    pub fn new(
        store: Arc<dyn StorePort + Send + Sync>,
        oracle: Arc<dyn QuoteOracle + Send + Sync>,
    ) -> Self {
        Self {
            store,
            oracle,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap();
        locks.entry(user_id).or_default().clone()
    }

    /// Buy `shares` of `symbol` at the current quoted price.
    pub fn buy(
        &self,
        user_id: i64,
        symbol: &str,
        shares: i64,
    ) -> Result<TradeOutcome, PapertradeError> {
        let symbol = validate_request(symbol, shares)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let quote = self
            .oracle
            .lookup(&symbol)?
            .ok_or_else(|| PapertradeError::SymbolNotFound {
                symbol: symbol.clone(),
            })?;

        let cost = round_cents(shares as f64 * quote.price);
        let cash = self.store.cash(user_id)?;
        if cash < cost {
            return Err(PapertradeError::InsufficientFunds {
                required: cost,
                available: cash,
            });
        }

        let new_cash = round_cents(cash - cost);
        let tx = NewTransaction {
            symbol: symbol.clone(),
            company: quote.name.clone(),
            shares,
            price: quote.price,
            total: cost,
            executed_at: chrono::Utc::now().naive_utc(),
        };
        self.store.apply_trade(user_id, &tx, new_cash)?;

        Ok(TradeOutcome {
            symbol,
            company: quote.name,
            shares,
            unit_price: quote.price,
            total: cost,
            new_cash,
        })
    }

    /// Sell `shares` of `symbol` at the current quoted price.
    pub fn sell(
        &self,
        user_id: i64,
        symbol: &str,
        shares: i64,
    ) -> Result<TradeOutcome, PapertradeError> {
        let symbol = validate_request(symbol, shares)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let quote = self
            .oracle
            .lookup(&symbol)?
            .ok_or_else(|| PapertradeError::SymbolNotFound {
                symbol: symbol.clone(),
            })?;

        let held = self.store.net_shares(user_id, &symbol)?;
        if shares > held {
            return Err(PapertradeError::InsufficientShares {
                symbol,
                requested: shares,
                held,
            });
        }

        let proceeds = round_cents(shares as f64 * quote.price);
        let cash = self.store.cash(user_id)?;
        let new_cash = round_cents(cash + proceeds);

        let tx = NewTransaction {
            symbol: symbol.clone(),
            company: quote.name.clone(),
            shares: -shares,
            price: quote.price,
            total: proceeds,
            executed_at: chrono::Utc::now().naive_utc(),
        };
        self.store.apply_trade(user_id, &tx, new_cash)?;

        Ok(TradeOutcome {
            symbol,
            company: quote.name,
            shares,
            unit_price: quote.price,
            total: proceeds,
            new_cash,
        })
    }
}

fn validate_request(symbol: &str, shares: i64) -> Result<String, PapertradeError> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(PapertradeError::invalid_input("symbol is required"));
    }
    if shares <= 0 {
        return Err(PapertradeError::invalid_input(
            "share count must be a positive integer",
        ));
    }
    Ok(symbol)
}
