//! Fixed-loss sizer: risk a constant quote amount down to `lowest`.
//!
//! ```text
//! stop  = lowest[last row]
//! size  = max_loss_per_trade / (rate - stop)
//! stake = size * rate
//! ```
//!
//! Example: rate 100, lowest 90, max loss 10 USD gives size 1 and stake 100.

use super::{Sizer, SizingError, SizingRequest};

#[derive(Debug, Clone)]
pub struct FixedLossSizer {
    max_loss_per_trade: f64,
}

impl FixedLossSizer {
    pub fn new(max_loss_per_trade: f64) -> Self {
        Self { max_loss_per_trade }
    }
}

impl Sizer for FixedLossSizer {
    fn name(&self) -> &str {
        "fixed_usd_loss"
    }

    fn stop_price(&self, _rate: f64, lowest: Option<f64>) -> Result<f64, SizingError> {
        lowest
            .filter(|l| l.is_finite())
            .ok_or(SizingError::UndefinedStop)
    }

    fn risk_budget(&self, _request: &SizingRequest) -> f64 {
        self.max_loss_per_trade
    }
}
