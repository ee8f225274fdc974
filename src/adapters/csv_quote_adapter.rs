//! CSV-directory quote adapter.
//!
//! Serves quotes and price history from local CSV files, one file per
//! symbol: `<DIR>/<SYMBOL>.csv` with a `date,close` header, rows in
//! chronological order. The current price is the last close. Useful for
//! offline development and deterministic tests; an unknown symbol is simply
//! a missing file.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::error::PapertradeError;
use crate::domain::quote::{normalize_symbol, ClosingPrice, Quote};
use crate::ports::quote_port::QuoteOracle;

pub struct CsvQuoteAdapter {
    base_path: PathBuf,
}

impl CsvQuoteAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_history(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<ClosingPrice>>, PapertradeError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| PapertradeError::Database {
            reason: format!("failed to open {}: {e}", path.display()),
        })?;

        let mut closes = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| PapertradeError::Database {
                reason: format!("CSV parse error in {}: {e}", path.display()),
            })?;

            let date_str = record.get(0).ok_or_else(|| PapertradeError::Database {
                reason: format!("missing date column in {}", path.display()),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                PapertradeError::Database {
                    reason: format!("invalid date in {}: {e}", path.display()),
                }
            })?;

            let close: f64 = record
                .get(1)
                .ok_or_else(|| PapertradeError::Database {
                    reason: format!("missing close column in {}", path.display()),
                })?
                .parse()
                .map_err(|e| PapertradeError::Database {
                    reason: format!("invalid close value in {}: {e}", path.display()),
                })?;

            closes.push(ClosingPrice { date, close });
        }

        if closes.is_empty() {
            return Ok(None);
        }
        Ok(Some(closes))
    }
}

impl QuoteOracle for CsvQuoteAdapter {
    fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError> {
        let symbol = normalize_symbol(symbol);
        match self.read_history(&symbol)? {
            Some(closes) => {
                let last = closes.last().expect("read_history filters empty files");
                Ok(Some(Quote {
                    name: symbol.clone(),
                    symbol,
                    price: last.close,
                }))
            }
            None => Ok(None),
        }
    }

    fn price_history(
        &self,
        symbol: &str,
    ) -> Result<Option<Vec<ClosingPrice>>, PapertradeError> {
        self.read_history(&normalize_symbol(symbol))
    }
}
