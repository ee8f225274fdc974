//! Quote oracle port trait.

use crate::domain::error::PapertradeError;
use crate::domain::quote::{ClosingPrice, Quote};

/// External market-data lookup. Network-backed implementations are
/// unreliable: callers must handle `Ok(None)` (unknown symbol) as well as
/// `OracleUnavailable` errors.
pub trait QuoteOracle {
    /// Current name and price for a symbol, or `None` if the provider does
    /// not know it.
    fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError>;

    /// Full available daily closing-price history in chronological order,
    /// or `None` if the provider has no history for the symbol.
    fn price_history(&self, symbol: &str)
    -> Result<Option<Vec<ClosingPrice>>, PapertradeError>;
}
