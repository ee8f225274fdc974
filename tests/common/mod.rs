#![allow(dead_code)]

use chrono::NaiveDate;
use papertrade::adapters::sqlite_adapter::SqliteAdapter;
use papertrade::adapters::web::{build_router, AppState};
use papertrade::domain::error::PapertradeError;
use papertrade::domain::quote::{ClosingPrice, Quote};
use papertrade::ports::config_port::ConfigPort;
use papertrade::ports::quote_port::QuoteOracle;
pub use papertrade::ports::store_port::StorePort;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MockQuoteOracle {
    pub quotes: HashMap<String, Quote>,
    pub histories: HashMap<String, Vec<ClosingPrice>>,
    pub unavailable: bool,
}

impl MockQuoteOracle {
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

impl QuoteOracle for MockQuoteOracle {
    fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError> {
        if self.unavailable {
            return Err(PapertradeError::OracleUnavailable {
                reason: "mock oracle down".to_string(),
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
                reason: "mock oracle down".to_string(),
            });
        }
        Ok(self.histories.get(symbol).cloned())
    }
}

pub struct MockConfigPort {
    pub starting_cash: f64,
}

impl MockConfigPort {
    pub fn new() -> Self {
        Self {
            starting_cash: 10_000.0,
        }
    }
}

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("auth", "session_secret") => Some(
                "00000000000000000000000000000001\
                 00000000000000000000000000000001\
                 00000000000000000000000000000001\
                 00000000000000000000000000000001"
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
        default
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match (section, key) {
            ("trading", "starting_cash") => self.starting_cash,
            _ => default,
        }
    }

    fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
        default
    }
}

/// In-memory store with the schema applied.
pub fn fresh_store() -> Arc<SqliteAdapter> {
    let store = Arc::new(SqliteAdapter::in_memory().unwrap());
    store.initialize_schema().unwrap();
    store
}

/// Router over the given oracle and store, wired exactly as `serve` does.
pub fn build_test_router(
    store: Arc<SqliteAdapter>,
    oracle: MockQuoteOracle,
) -> axum::Router {
    let state = AppState::new(store, Arc::new(oracle), Arc::new(MockConfigPort::new()));
    build_router(state).unwrap()
}

/// Create a user directly in the store; returns its id.
pub fn seed_user(store: &SqliteAdapter, username: &str, password: &str, cash: f64) -> i64 {
    let hash = papertrade::adapters::web::hash_password(password).unwrap();
    store.create_user(username, &hash, cash).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` daily closes starting at `start_price`, moving by `step` per day.
pub fn linear_closes(start_date: &str, count: usize, start_price: f64, step: f64) -> Vec<ClosingPrice> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| ClosingPrice {
            date: start + chrono::Duration::days(i as i64),
            close: start_price + i as f64 * step,
        })
        .collect()
}
