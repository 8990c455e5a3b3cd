//! Position sizers: translate a risk budget and a stop into a stake.
//!
//! Every sizer answers two questions: where is the stop for an entry at
//! `current_rate`, and how much quote currency may be lost if it is hit.
//! `size_stake` turns those into a quantity and a stake and applies the
//! host's stake bounds.
//!
//! Inputs that would divide by zero or produce a negative or infinite stake
//! (rate at or below the stop, undefined stop reference, non-positive
//! budget, empty or inverted stake bounds) are rejected with a `SizingError` instead of sized.

pub mod fixed_fraction;
pub mod fixed_loss;

pub use fixed_fraction::FixedFractionSizer;
pub use fixed_loss::FixedLossSizer;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::SizingConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SizingError {
    #[error("current rate must be positive and finite, got {0}")]
    InvalidRate(f64),
    #[error("stop reference is not available yet")]
    UndefinedStop,
    #[error("stop {stop} is not below current rate {rate}")]
    StopNotBelowRate { stop: f64, rate: f64 },
    #[error("risk budget must be positive and finite, got {0}")]
    InvalidBudget(f64),
    #[error("stake bounds are unusable: min {min_stake:?}, max {max_stake}")]
    InvalidStakeBounds { min_stake: Option<f64>, max_stake: f64 },
    #[error("stake {stake} is below the minimum stake {min_stake}")]
    BelowMinStake { stake: f64, min_stake: f64 },
}

/// What the host passes when it asks for a stake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingRequest {
    pub pair: String,
    pub current_time: DateTime<Utc>,
    pub current_rate: f64,
    pub proposed_stake: f64,
    pub min_stake: Option<f64>,
    pub max_stake: f64,
    /// Wallet balance at the start of the run (fixed-fraction budget base).
    pub starting_balance: f64,
}

/// Result of a successful sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StakeDecision {
    pub stop_price: f64,
    /// Quantity in base currency.
    pub size: f64,
    /// Quote currency committed: `size * current_rate`, after bounds.
    pub stake: f64,
    /// True if the stake was cut down to `max_stake`.
    pub clamped: bool,
}

/// Stake sizing logic.
pub trait Sizer: Send + Sync {
    fn name(&self) -> &str;

    /// Stop price for an entry at `rate`. `lowest` is the latest rolling
    /// minimum, if defined.
    fn stop_price(&self, rate: f64, lowest: Option<f64>) -> Result<f64, SizingError>;

    /// Quote currency lost if the stop is hit.
    fn risk_budget(&self, request: &SizingRequest) -> f64;
}

/// Build the sizer described by `config`.
pub fn build_sizer(config: &SizingConfig) -> Box<dyn Sizer> {
    match *config {
        SizingConfig::FixedUsdLoss { max_loss_per_trade } => {
            Box::new(FixedLossSizer::new(max_loss_per_trade))
        }
        SizingConfig::FixedFraction {
            risk_fraction,
            stoploss,
        } => Box::new(FixedFractionSizer::new(risk_fraction, stoploss)),
    }
}

/// `max_stake` must be positive and finite and at least `min_stake`.
fn check_bounds(request: &SizingRequest) -> Result<(), SizingError> {
    let max_stake = request.max_stake;
    let min_ok = request
        .min_stake
        .map_or(true, |min| min.is_finite() && min <= max_stake);
    if max_stake.is_finite() && max_stake > 0.0 && min_ok {
        Ok(())
    } else {
        Err(SizingError::InvalidStakeBounds {
            min_stake: request.min_stake,
            max_stake,
        })
    }
}

/// Size a stake: `size = budget / (rate - stop)`, `stake = size * rate`.
pub fn size_stake(
    sizer: &dyn Sizer,
    request: &SizingRequest,
    lowest: Option<f64>,
) -> Result<StakeDecision, SizingError> {
    let rate = request.current_rate;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(SizingError::InvalidRate(rate));
    }
    check_bounds(request)?;

    let stop = sizer.stop_price(rate, lowest)?;
    let distance = rate - stop;
    if !(distance > 0.0) {
        return Err(SizingError::StopNotBelowRate { stop, rate });
    }

    let budget = sizer.risk_budget(request);
    if !(budget.is_finite() && budget > 0.0) {
        return Err(SizingError::InvalidBudget(budget));
    }

    let mut size = budget / distance;
    let mut stake = size * rate;
    let clamped = stake > request.max_stake;
    if clamped {
        stake = request.max_stake;
        size = stake / rate;
    }

    if let Some(min_stake) = request.min_stake {
        if stake < min_stake {
            return Err(SizingError::BelowMinStake { stake, min_stake });
        }
    }

    Ok(StakeDecision {
        stop_price: stop,
        size,
        stake,
        clamped,
    })
}

#[cfg(test)]
pub(crate) fn request(rate: f64) -> SizingRequest {
    SizingRequest {
        pair: "BTC/USDT".into(),
        current_time: Utc::now(),
        current_rate: rate,
        proposed_stake: 50.0,
        min_stake: None,
        max_stake: 1_000_000.0,
        starting_balance: 1000.0,
    }
}
