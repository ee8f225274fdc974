//! Linear-trend price projection.
//!
//! Ordinary least squares of closing price against the day index, then the
//! fitted line extrapolated 365 days past the last observation. This is a
//! deliberately simplistic trend extrapolation, not a forecasting model; the
//! R²-based quality figure exists so the UI can warn when the trend explains
//! little of the variance.

use std::sync::Arc;

use crate::domain::error::PapertradeError;
use crate::domain::quote::normalize_symbol;
use crate::ports::quote_port::QuoteOracle;

/// Trading days projected beyond the last observed close.
pub const HORIZON_DAYS: usize = 365;

/// A fitted line `price = slope * index + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, in [0, 1].
    pub r_squared: f64,
}

impl LinearFit {
    pub fn value_at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}

/// Least-squares fit of `values` against their 0-based index.
///
/// A series with zero variance is an exact horizontal line, so R² is 1 when
/// the residuals are negligible and 0 otherwise.
pub fn fit_line(values: &[f64]) -> LinearFit {
    let n = values.len() as f64;
    debug_assert!(values.len() >= 2);

    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let fitted = slope * i as f64 + intercept;
        ss_res += (y - fitted) * (y - fitted);
        ss_tot += (y - mean_y) * (y - mean_y);
    }

    let r_squared = if ss_tot > f64::EPSILON {
        1.0 - ss_res / ss_tot
    } else if ss_res < 1e-9 {
        1.0
    } else {
        0.0
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}

/// A 365-day-ahead projection for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub symbol: String,
    /// Last observed close, not the fitted value.
    pub current_price: f64,
    pub projected_price: f64,
    /// R² scaled to 0-100.
    pub fit_quality_pct: f64,
}

pub struct Projector {
    oracle: Arc<dyn QuoteOracle + Send + Sync>,
}

impl Projector {
    pub fn new(oracle: Arc<dyn QuoteOracle + Send + Sync>) -> Self {
        Self { oracle }
    }

    pub fn project(&self, symbol: &str) -> Result<Projection, PapertradeError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(PapertradeError::invalid_input("symbol is required"));
        }

        let history = self
            .oracle
            .price_history(&symbol)?
            .ok_or_else(|| PapertradeError::NoData {
                symbol: symbol.clone(),
            })?;
        if history.len() < 2 {
            return Err(PapertradeError::NoData { symbol });
        }

        let closes: Vec<f64> = history.iter().map(|p| p.close).collect();
        let fit = fit_line(&closes);

        // Last observation sits at index len - 1; the projection lands
        // HORIZON_DAYS past it.
        let projected = fit.value_at(closes.len() - 1 + HORIZON_DAYS);

        Ok(Projection {
            symbol,
            current_price: round2(*closes.last().expect("history is non-empty")),
            projected_price: round2(projected),
            fit_quality_pct: round2(fit.r_squared * 100.0),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
