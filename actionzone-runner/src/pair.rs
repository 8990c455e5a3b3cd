//! Per-pair analyzed state: series plus the frames derived from it.

use actionzone_core::{
    ActionZone, Candle, FrameError, IndicatorFrame, Series, SeriesError, SignalFrame, SignalRow,
};

/// Everything the runner keeps for one trading pair.
///
/// The three parts always cover the same number of rows.
#[derive(Debug, Clone)]
pub struct PairState {
    series: Series,
    frame: IndicatorFrame,
    signals: SignalFrame,
}

impl PairState {
    pub fn new(pair: &str, strategy: &ActionZone) -> Result<Self, FrameError> {
        Ok(Self {
            series: Series::new(pair, strategy.config().timeframe),
            frame: IndicatorFrame::new(strategy.config())?,
            signals: SignalFrame::default(),
        })
    }

    pub fn pair(&self) -> &str {
        self.series.pair()
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn frame(&self) -> &IndicatorFrame {
        &self.frame
    }

    pub fn signals(&self) -> &SignalFrame {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Append one candle and analyze it. A rejected candle leaves the state
    /// untouched.
    pub fn push(&mut self, candle: Candle, strategy: &ActionZone) -> Result<SignalRow, PushError> {
        self.series.push(candle)?;
        strategy.extend_indicators(&mut self.frame, &self.series)?;
        self.signals.extend(&self.series, &self.frame);
        Ok(self.signals.latest().unwrap_or(SignalRow::NONE))
    }

    /// Append many candles, then analyze them in one extension.
    pub fn push_all(
        &mut self,
        candles: impl IntoIterator<Item = Candle>,
        strategy: &ActionZone,
    ) -> Result<usize, PushError> {
        let mut appended = 0;
        let mut rejected = None;
        for candle in candles {
            match self.series.push(candle) {
                Ok(()) => appended += 1,
                Err(e) => {
                    rejected = Some(e);
                    break;
                }
            }
        }
        strategy.extend_indicators(&mut self.frame, &self.series)?;
        self.signals.extend(&self.series, &self.frame);
        match rejected {
            Some(e) => Err(e.into()),
            None => Ok(appended),
        }
    }
}

/// Why a candle could not be appended to a pair.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PushError {
    #[error(transparent)]
    Candle(#[from] SeriesError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}
