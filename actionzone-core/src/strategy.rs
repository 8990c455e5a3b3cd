//! `ActionZone`: the host-facing strategy object.
//!
//! Wraps one validated `StrategyConfig` and exposes the host callbacks as
//! plain functions over explicit inputs: indicators and signals from a
//! series, stake and stop-loss from the last analyzed row.

use crate::config::{ConfigError, Preset, StrategyConfig};
use crate::domain::Series;
use crate::frame::{FrameError, IndicatorFrame};
use crate::signals::SignalFrame;
use crate::sizers::{build_sizer, size_stake, Sizer, SizingError, SizingRequest, StakeDecision};
use crate::stoploss::{self, StopLossDecision, StopLossRequest};

pub struct ActionZone {
    config: StrategyConfig,
    sizer: Box<dyn Sizer>,
}

impl std::fmt::Debug for ActionZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionZone")
            .field("config", &self.config)
            .field("sizer", &self.sizer.name())
            .finish()
    }
}

impl ActionZone {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sizer = build_sizer(&config.sizing);
        Ok(Self { config, sizer })
    }

    pub fn from_preset(preset: Preset) -> Result<Self, ConfigError> {
        Self::new(preset.config())
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Candles of history needed before any value is defined.
    pub fn startup_count(&self) -> usize {
        self.config.startup_count()
    }

    pub fn sizer_name(&self) -> &str {
        self.sizer.name()
    }

    pub fn populate_indicators(&self, series: &Series) -> Result<IndicatorFrame, FrameError> {
        let frame = IndicatorFrame::compute(series, &self.config)?;
        tracing::debug!(
            pair = series.pair(),
            rows = frame.len(),
            config = frame.fingerprint().short(),
            "computed indicator frame"
        );
        Ok(frame)
    }

    /// Extend `frame` with candles appended to `series` since it was built.
    pub fn extend_indicators(
        &self,
        frame: &mut IndicatorFrame,
        series: &Series,
    ) -> Result<usize, FrameError> {
        frame.extend(series, &self.config)
    }

    pub fn populate_signals(&self, series: &Series, frame: &IndicatorFrame) -> SignalFrame {
        SignalFrame::classify(series, frame)
    }

    /// Indicators and signals in one pass.
    pub fn analyze(&self, series: &Series) -> Result<(IndicatorFrame, SignalFrame), FrameError> {
        let frame = self.populate_indicators(series)?;
        let signals = self.populate_signals(series, &frame);
        Ok((frame, signals))
    }

    /// Stake for a new entry, using `lowest` of the last analyzed row.
    pub fn custom_stake_amount(
        &self,
        request: &SizingRequest,
        frame: &IndicatorFrame,
    ) -> Result<StakeDecision, SizingError> {
        let result = size_stake(self.sizer.as_ref(), request, frame.last_lowest());
        if let Err(e) = &result {
            tracing::warn!(
                pair = %request.pair,
                rate = request.current_rate,
                error = %e,
                "rejected stake request"
            );
        }
        result
    }

    pub fn custom_stoploss(
        &self,
        request: &StopLossRequest,
        frame: &IndicatorFrame,
    ) -> Result<StopLossDecision, SizingError> {
        let mode = self.config.stoploss.mode;
        let result = stoploss::custom_stoploss(mode, request, frame.last_lowest());
        if let Err(e) = &result {
            tracing::warn!(pair = %request.pair, error = %e, "could not place initial stop");
        }
        result
    }
}
