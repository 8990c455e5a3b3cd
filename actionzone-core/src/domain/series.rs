//! Series: append-only candle history for one pair at one timeframe.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::{Candle, Timeframe};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("candle at {timestamp} is not after the last candle at {last}")]
    NotIncreasing {
        last: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    #[error("candle at {timestamp} is not a whole number of {timeframe} steps after {last}")]
    OffCadence {
        last: DateTime<Utc>,
        timestamp: DateTime<Utc>,
        timeframe: Timeframe,
    },
    #[error("candle at {0} has a non-finite field")]
    NonFinite(DateTime<Utc>),
    #[error("candle at {timestamp} has negative volume {volume}")]
    NegativeVolume {
        timestamp: DateTime<Utc>,
        volume: f64,
    },
}

/// Ordered candles with strictly increasing timestamps, each a whole number
/// of `timeframe` steps after the previous one (gaps allowed).
///
/// Historical candles are never mutated; the only way to grow a series is
/// `push`, which validates the new candle against the last one.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pair: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl Series {
    pub fn new(pair: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            pair: pair.into(),
            timeframe,
            candles: Vec::new(),
        }
    }

    /// Build a series from candles, validating each one in order.
    pub fn from_candles(
        pair: impl Into<String>,
        timeframe: Timeframe,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new(pair, timeframe);
        for candle in candles {
            series.push(candle)?;
        }
        Ok(series)
    }

    /// Append one candle.
    pub fn push(&mut self, candle: Candle) -> Result<(), SeriesError> {
        if !candle.is_finite() {
            return Err(SeriesError::NonFinite(candle.timestamp));
        }
        if candle.volume < 0.0 {
            return Err(SeriesError::NegativeVolume {
                timestamp: candle.timestamp,
                volume: candle.volume,
            });
        }
        if let Some(last) = self.candles.last() {
            if candle.timestamp <= last.timestamp {
                return Err(SeriesError::NotIncreasing {
                    last: last.timestamp,
                    timestamp: candle.timestamp,
                });
            }
            let gap_ms = (candle.timestamp - last.timestamp).num_milliseconds();
            if gap_ms % (self.timeframe.seconds() * 1000) != 0 {
                return Err(SeriesError::OffCadence {
                    last: last.timestamp,
                    timestamp: candle.timestamp,
                    timeframe: self.timeframe,
                });
            }
        }
        self.candles.push(candle);
        Ok(())
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
