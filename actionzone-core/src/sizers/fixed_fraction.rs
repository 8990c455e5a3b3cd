//! Fixed-fraction sizer
//!
//! Risk a fraction of the starting balance with the stop at a fixed
//! percentage below entry.
//!
//! # Formula
//! ```text
//! budget = starting_balance * risk_fraction
//! stop   = rate * (1 + stoploss)          // stoploss < 0
//! size   = budget / (rate - stop)
//! ```
//!
//! # Example
//! - Starting balance: 1000 USDT, risk 2% (20 USDT)
//! - Rate 50, stoploss -0.10, stop 45
//! - Size: 20 / 5 = 4, stake 200

use super::{Sizer, SizingError, SizingRequest};

#[derive(Debug, Clone)]
pub struct FixedFractionSizer {
    /// Fraction of the starting balance at risk (e.g. 0.02).
    risk_fraction: f64,
    /// Stop distance relative to entry, negative (e.g. -0.10).
    stoploss: f64,
}

impl FixedFractionSizer {
    pub fn new(risk_fraction: f64, stoploss: f64) -> Self {
        Self {
            risk_fraction,
            stoploss,
        }
    }
}

impl Sizer for FixedFractionSizer {
    fn name(&self) -> &str {
        "fixed_fraction"
    }

    fn stop_price(&self, rate: f64, _lowest: Option<f64>) -> Result<f64, SizingError> {
        Ok(rate * (1.0 + self.stoploss))
    }

    fn risk_budget(&self, request: &SizingRequest) -> f64 {
        request.starting_balance * self.risk_fraction
    }
}
