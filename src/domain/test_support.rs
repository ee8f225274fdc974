//! In-memory test doubles for the store and oracle ports.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::domain::error::PapertradeError;
use crate::domain::quote::{ClosingPrice, Quote};
use crate::domain::transaction::{Holding, NewTransaction, Transaction};
use crate::ports::quote_port::QuoteOracle;
use crate::ports::store_port::{StorePort, UserRecord};

#[derive(Default)]
struct MemoryStoreInner {
    users: Vec<UserRecord>,
    transactions: Vec<Transaction>,
    next_user_id: i64,
    next_tx_id: i64,
}

/// Straight-line in-memory store double. Sequences ids like SQLite would.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner {
                next_user_id: 1,
                next_tx_id: 1,
                ..Default::default()
            }),
        }
    }

    pub fn add_user(&self, username: &str, password_hash: &str, cash: f64) -> i64 {
        self.create_user(username, password_hash, cash).unwrap()
    }
}

impl StorePort for MemoryStore {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: f64,
    ) -> Result<i64, PapertradeError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.username == username) {
            return Err(PapertradeError::DuplicateUsername {
                username: username.to_string(),
            });
        }
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        inner.users.push(UserRecord {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            cash: starting_cash,
        });
        Ok(id)
    }

    fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>, PapertradeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == user_id).cloned())
    }

    fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, PapertradeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    fn cash(&self, user_id: i64) -> Result<f64, PapertradeError> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.cash)
            .ok_or_else(|| PapertradeError::DatabaseQuery {
                reason: format!("no such user: {user_id}"),
            })
    }

    fn set_cash(&self, user_id: i64, amount: f64) -> Result<(), PapertradeError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.cash = amount;
                Ok(())
            }
            None => Err(PapertradeError::DatabaseQuery {
                reason: format!("no such user: {user_id}"),
            }),
        }
    }

    fn record_transaction(
        &self,
        user_id: i64,
        tx: &NewTransaction,
    ) -> Result<i64, PapertradeError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_tx_id;
        inner.next_tx_id += 1;
        inner.transactions.push(Transaction {
            id,
            user_id,
            symbol: tx.symbol.clone(),
            company: tx.company.clone(),
            shares: tx.shares,
            price: tx.price,
            total: tx.total,
            executed_at: tx.executed_at,
        });
        Ok(id)
    }

    fn transactions(&self, user_id: i64) -> Result<Vec<Transaction>, PapertradeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn net_shares(&self, user_id: i64, symbol: &str) -> Result<i64, PapertradeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.symbol == symbol)
            .map(|t| t.shares)
            .sum())
    }

    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, PapertradeError> {
        let inner = self.inner.lock().unwrap();
        let mut order: Vec<String> = Vec::new();
        let mut net: HashMap<String, (String, i64)> = HashMap::new();
        for t in inner.transactions.iter().filter(|t| t.user_id == user_id) {
            let entry = net
                .entry(t.symbol.clone())
                .or_insert_with(|| (t.company.clone(), 0));
            entry.1 += t.shares;
            if !order.contains(&t.symbol) {
                order.push(t.symbol.clone());
            }
        }
        Ok(order
            .into_iter()
            .filter_map(|symbol| {
                let (company, shares) = net.get(&symbol).cloned()?;
                (shares > 0).then_some(Holding {
                    symbol,
                    company,
                    shares,
                })
            })
            .collect())
    }

    fn apply_trade(
        &self,
        user_id: i64,
        tx: &NewTransaction,
        new_cash: f64,
    ) -> Result<i64, PapertradeError> {
        let id = self.record_transaction(user_id, tx)?;
        self.set_cash(user_id, new_cash)?;
        Ok(id)
    }
}

pub struct MockOracle {
    quotes: HashMap<String, Quote>,
    histories: HashMap<String, Vec<ClosingPrice>>,
    unavailable: bool,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            histories: HashMap::new(),
            unavailable: false,
        }
    }

    pub fn with_quote(mut self, symbol: &str, name: &str, price: f64) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
            },
        );
        self
    }

    pub fn with_history(mut self, symbol: &str, closes: Vec<ClosingPrice>) -> Self {
        self.histories.insert(symbol.to_string(), closes);
        self
    }

    pub fn unavailable() -> Self {
        Self {
            quotes: HashMap::new(),
            histories: HashMap::new(),
            unavailable: true,
        }
    }
}

impl QuoteOracle for MockOracle {
    fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError> {
        if self.unavailable {
            return Err(PapertradeError::OracleUnavailable {
                reason: "mock oracle offline".into(),
            });
        }
        Ok(self.quotes.get(symbol).cloned())
    }

    fn price_history(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<ClosingPrice>>, PapertradeError> {
        if self.unavailable {
            return Err(PapertradeError::OracleUnavailable {
                reason: "mock oracle offline".into(),
            });
        }
        Ok(self.histories.get(symbol).cloned())
    }
}

/// Build a NewTransaction the way the settlement engine would.
pub fn trade(symbol: &str, shares: i64, price: f64) -> NewTransaction {
    NewTransaction {
        symbol: symbol.to_string(),
        company: format!("{symbol} Corp"),
        shares,
        price,
        total: crate::domain::money::round_cents(shares.abs() as f64 * price),
        executed_at: test_time(),
    }
}

pub fn test_time() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}
