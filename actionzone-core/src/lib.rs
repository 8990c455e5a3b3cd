//! ActionZone Core: indicators, signals and risk sizing for the ActionZone
//! EMA trend strategy.
//!
//! This crate is the host-independent decision engine:
//! - Domain types (candles, append-only series, timeframes)
//! - Indicators: EMA, rolling minimum, higher-timeframe resampling overlay
//! - `IndicatorFrame`: batch and incremental per-row indicator columns
//! - `SignalFrame`: memoryless entry/exit classification
//! - Sizers and the one-shot dynamic stop-loss
//! - `StrategyConfig` with presets and a BLAKE3 fingerprint
//!
//! Order execution, exchange connectivity and trade persistence belong to
//! the host.

pub mod config;
pub mod domain;
pub mod frame;
pub mod indicators;
pub mod signals;
pub mod sizers;
pub mod stoploss;
pub mod strategy;

pub use config::{ConfigError, ConfigFingerprint, Preset, SizingConfig, StopLossMode, StrategyConfig};
pub use domain::{Candle, PriceSource, Series, SeriesError, Timeframe};
pub use frame::{FrameError, IndicatorFrame, IndicatorRow};
pub use signals::{SignalFrame, SignalRow};
pub use sizers::{SizingError, SizingRequest, StakeDecision};
pub use stoploss::{StopLossDecision, StopLossRequest};
pub use strategy::ActionZone;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a per-pair worker owns is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<Series>();
        require_sync::<Series>();
        require_send::<IndicatorFrame>();
        require_sync::<IndicatorFrame>();
        require_send::<SignalFrame>();
        require_sync::<SignalFrame>();
        require_send::<StrategyConfig>();
        require_sync::<StrategyConfig>();
        require_send::<ActionZone>();
        require_sync::<ActionZone>();
        require_send::<SizingError>();
        require_sync::<SizingError>();
        require_send::<FrameError>();
        require_sync::<FrameError>();
    }
}
