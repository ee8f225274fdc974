//! HTTP quote adapter.
//!
//! Talks to a JSON market-data service:
//!
//! - `GET {base_url}/quote/{symbol}` -> `{"symbol": "...", "name": "...", "price": 1.0}`
//! - `GET {base_url}/history/{symbol}` -> `[{"date": "2024-01-02", "close": 1.0}, ...]`
//!
//! A 404 means the provider does not know the symbol. Transport failures and
//! timeouts surface as `OracleUnavailable`; callers fail the enclosing
//! operation rather than retry.

use chrono::NaiveDate;
use std::time::Duration;

use crate::domain::error::PapertradeError;
use crate::domain::quote::{normalize_symbol, ClosingPrice, Quote};
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuoteOracle;

#[derive(Debug, serde::Deserialize)]
struct QuotePayload {
    symbol: String,
    name: String,
    price: f64,
}

#[derive(Debug, serde::Deserialize)]
struct HistoryRow {
    date: String,
    close: f64,
}

pub struct HttpQuoteAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpQuoteAdapter {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, PapertradeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PapertradeError::OracleUnavailable {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PapertradeError> {
        let base_url =
            config
                .get_string("oracle", "base_url")
                .ok_or_else(|| PapertradeError::ConfigMissing {
                    section: "oracle".into(),
                    key: "base_url".into(),
                })?;
        let timeout_secs = config.get_int("oracle", "timeout_secs", 10);
        Self::new(base_url, Duration::from_secs(timeout_secs.max(1) as u64))
    }

    fn get(&self, path: &str) -> Result<Option<reqwest::blocking::Response>, PapertradeError> {
        let url = format!("{}{path}", self.base_url);
        let response =
            self.client
                .get(&url)
                .send()
                .map_err(|e| PapertradeError::OracleUnavailable {
                    reason: e.to_string(),
                })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PapertradeError::OracleUnavailable {
                reason: format!("provider returned HTTP {}", response.status()),
            });
        }
        Ok(Some(response))
    }
}

impl QuoteOracle for HttpQuoteAdapter {
    fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError> {
        let symbol = normalize_symbol(symbol);
        let Some(response) = self.get(&format!("/quote/{symbol}"))? else {
            return Ok(None);
        };

        let payload: QuotePayload =
            response
                .json()
                .map_err(|e| PapertradeError::OracleUnavailable {
                    reason: format!("malformed quote payload: {e}"),
                })?;

        Ok(Some(Quote {
            symbol: normalize_symbol(&payload.symbol),
            name: payload.name,
            price: payload.price,
        }))
    }

    fn price_history(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<ClosingPrice>>, PapertradeError> {
        let symbol = normalize_symbol(symbol);
        let Some(response) = self.get(&format!("/history/{symbol}"))? else {
            return Ok(None);
        };

        let rows: Vec<HistoryRow> =
            response
                .json()
                .map_err(|e| PapertradeError::OracleUnavailable {
                    reason: format!("malformed history payload: {e}"),
                })?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut closes = Vec::with_capacity(rows.len());
        for row in rows {
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                PapertradeError::OracleUnavailable {
                    reason: format!("malformed history date {}: {e}", row.date),
                }
            })?;
            closes.push(ClosingPrice {
                date,
                close: row.close,
            });
        }
        closes.sort_by_key(|p| p.date);
        Ok(Some(closes))
    }
}
