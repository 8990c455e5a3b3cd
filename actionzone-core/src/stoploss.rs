//! Dynamic stop-loss: one-shot placement at `lowest` right after entry.
//!
//! On the first evaluation of a freshly opened trade the stop is set to the
//! rolling minimum, expressed relative to the current rate. Every later
//! evaluation keeps whatever stop is active. This is not a trailing stop.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::StopLossMode;
use crate::sizers::SizingError;

/// Host-side trade state at one stop-loss evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopLossRequest {
    pub pair: String,
    pub open_time: DateTime<Utc>,
    pub current_time: DateTime<Utc>,
    pub current_rate: f64,
    pub current_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StopLossDecision {
    /// New stop as a (negative) fraction of the current rate.
    Set(f64),
    /// Leave the active stop alone.
    Keep,
}

impl StopLossDecision {
    /// Value returned to the host. `Keep` is `1.0`, which is above any real
    /// stoploss and therefore never replaces the active one.
    pub const KEEP_SENTINEL: f64 = 1.0;

    pub fn to_host_value(self) -> f64 {
        match self {
            Self::Set(fraction) => fraction,
            Self::Keep => Self::KEEP_SENTINEL,
        }
    }
}

/// Evaluations within this many seconds after the open count as a new trade.
pub const NEW_TRADE_WINDOW_SECS: i64 = 60;

/// True for the first evaluation of a trade that has not moved yet.
pub fn is_new_trade(request: &StopLossRequest) -> bool {
    let window = Duration::seconds(NEW_TRADE_WINDOW_SECS);
    request.current_profit == 0.0 && request.current_time - window < request.open_time
}

pub fn custom_stoploss(
    mode: StopLossMode,
    request: &StopLossRequest,
    lowest: Option<f64>,
) -> Result<StopLossDecision, SizingError> {
    match mode {
        StopLossMode::Static => Ok(StopLossDecision::Keep),
        StopLossMode::InitialLowest => {
            if !is_new_trade(request) {
                return Ok(StopLossDecision::Keep);
            }

            let rate = request.current_rate;
            if !(rate.is_finite() && rate > 0.0) {
                return Err(SizingError::InvalidRate(rate));
            }
            let stop = lowest
                .filter(|l| l.is_finite())
                .ok_or(SizingError::UndefinedStop)?;
            if stop >= rate {
                return Err(SizingError::StopNotBelowRate { stop, rate });
            }

            Ok(StopLossDecision::Set(stop / rate - 1.0))
        }
    }
}
