//! Indicator frame: per-row indicator columns aligned with a `Series`.
//!
//! Row i of the frame always describes candle i of the series. Columns hold
//! `f64::NAN` where a value is not yet available; accessors turn that into
//! `None`. The frame keeps the streaming indicator states alive so that new
//! candles can be appended without touching earlier rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, ConfigFingerprint, StrategyConfig};
use crate::domain::{Candle, PriceSource, Series, Timeframe};
use crate::indicators::{EmaState, Overlay, OverlayValues, RollingMin};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid strategy config: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
    #[error("frame was built with config {expected}, not {actual}")]
    ConfigMismatch {
        expected: ConfigFingerprint,
        actual: ConfigFingerprint,
    },
    #[error("series timeframe {series} does not match configured timeframe {config}")]
    TimeframeMismatch {
        series: Timeframe,
        config: Timeframe,
    },
    #[error("series has {series} candles but the frame already covers {frame}")]
    SeriesShorter { series: usize, frame: usize },
    #[error("series history diverged from the frame at row {index}")]
    HistoryDiverged { index: usize },
}

impl From<ConfigError> for FrameError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Invalid(problems) => FrameError::InvalidConfig(problems),
            other => FrameError::InvalidConfig(vec![other.to_string()]),
        }
    }
}

/// One row of indicator values. NaN means "not yet available".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub lowest: f64,
    /// `Some` only in multi-timeframe mode (values inside may still be NaN).
    pub overlay: Option<OverlayValues>,
}

/// Higher-timeframe columns, forward-filled onto base rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayColumns {
    pub close: Vec<f64>,
    pub fast_ma: Vec<f64>,
    pub slow_ma: Vec<f64>,
}

#[derive(Debug, Clone)]
struct FrameState {
    fast: EmaState,
    slow: EmaState,
    lowest: RollingMin,
    lowest_source: PriceSource,
    overlay: Option<Overlay>,
}

impl FrameState {
    fn new(config: &StrategyConfig) -> Self {
        Self {
            fast: EmaState::new(config.fast_period),
            slow: EmaState::new(config.slow_period),
            lowest: RollingMin::new(config.min_price_period),
            lowest_source: config.lowest_source,
            overlay: config
                .overlay_timeframe()
                .map(|bucket| Overlay::new(bucket, config.fast_period, config.slow_period)),
        }
    }

    fn push(&mut self, candle: &Candle) -> IndicatorRow {
        IndicatorRow {
            fast_ma: self.fast.update(candle.close),
            slow_ma: self.slow.update(candle.close),
            lowest: self.lowest.update(candle.price(self.lowest_source)),
            overlay: self.overlay.as_mut().map(|o| o.push(candle)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorFrame {
    fast_ma: Vec<f64>,
    slow_ma: Vec<f64>,
    lowest: Vec<f64>,
    overlay: Option<OverlayColumns>,
    startup_count: usize,
    fingerprint: ConfigFingerprint,
    last_timestamp: Option<DateTime<Utc>>,
    #[serde(skip)]
    state: FrameState,
}

impl IndicatorFrame {
    /// An empty frame bound to `config`. Fails if `config` does not validate.
    pub fn new(config: &StrategyConfig) -> Result<Self, FrameError> {
        config.validate()?;
        Ok(Self {
            fast_ma: Vec::new(),
            slow_ma: Vec::new(),
            lowest: Vec::new(),
            overlay: config.overlay_timeframe().map(|_| OverlayColumns::default()),
            startup_count: config.startup_count(),
            fingerprint: config.fingerprint(),
            last_timestamp: None,
            state: FrameState::new(config),
        })
    }

    /// Compute the frame for a whole series from scratch.
    pub fn compute(series: &Series, config: &StrategyConfig) -> Result<Self, FrameError> {
        let mut frame = Self::new(config)?;
        frame.extend(series, config)?;
        Ok(frame)
    }

    /// Append rows for the candles in `series` that the frame has not seen.
    ///
    /// `series` must be the same history the frame was built from, possibly
    /// with more candles appended. Returns the number of rows added.
    pub fn extend(&mut self, series: &Series, config: &StrategyConfig) -> Result<usize, FrameError> {
        config.validate()?;
        let actual = config.fingerprint();
        if actual != self.fingerprint {
            return Err(FrameError::ConfigMismatch {
                expected: self.fingerprint.clone(),
                actual,
            });
        }
        if series.timeframe() != config.timeframe {
            return Err(FrameError::TimeframeMismatch {
                series: series.timeframe(),
                config: config.timeframe,
            });
        }

        let covered = self.len();
        if series.len() < covered {
            return Err(FrameError::SeriesShorter {
                series: series.len(),
                frame: covered,
            });
        }
        if covered > 0 {
            let anchor = series.get(covered - 1).map(|c| c.timestamp);
            if anchor != self.last_timestamp {
                return Err(FrameError::HistoryDiverged { index: covered - 1 });
            }
        }

        for candle in &series.candles()[covered..] {
            self.push(candle);
        }

        let added = series.len() - covered;
        if added > 0 {
            tracing::debug!(
                pair = series.pair(),
                added,
                rows = self.len(),
                "extended indicator frame"
            );
        }
        Ok(added)
    }

    fn push(&mut self, candle: &Candle) {
        let raw = self.state.push(candle);
        let warm = self.len() + 1 >= self.startup_count;
        let mask = |v: f64| if warm { v } else { f64::NAN };

        self.fast_ma.push(mask(raw.fast_ma));
        self.slow_ma.push(mask(raw.slow_ma));
        self.lowest.push(mask(raw.lowest));
        if let (Some(columns), Some(values)) = (self.overlay.as_mut(), raw.overlay) {
            columns.close.push(mask(values.close));
            columns.fast_ma.push(mask(values.fast_ma));
            columns.slow_ma.push(mask(values.slow_ma));
        }
        self.last_timestamp = Some(candle.timestamp);
    }

    pub fn len(&self) -> usize {
        self.fast_ma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast_ma.is_empty()
    }

    pub fn startup_count(&self) -> usize {
        self.startup_count
    }

    pub fn fingerprint(&self) -> &ConfigFingerprint {
        &self.fingerprint
    }

    /// Raw row at `index` (NaN for unavailable values).
    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        if index >= self.len() {
            return None;
        }
        Some(IndicatorRow {
            fast_ma: self.fast_ma[index],
            slow_ma: self.slow_ma[index],
            lowest: self.lowest[index],
            overlay: self.overlay.as_ref().map(|o| OverlayValues {
                close: o.close[index],
                fast_ma: o.fast_ma[index],
                slow_ma: o.slow_ma[index],
            }),
        })
    }

    pub fn fast_ma(&self, index: usize) -> Option<f64> {
        defined(self.fast_ma.get(index))
    }

    pub fn slow_ma(&self, index: usize) -> Option<f64> {
        defined(self.slow_ma.get(index))
    }

    pub fn lowest(&self, index: usize) -> Option<f64> {
        defined(self.lowest.get(index))
    }

    /// `lowest` of the last row: the stop reference at trade-decision time.
    pub fn last_lowest(&self) -> Option<f64> {
        self.len().checked_sub(1).and_then(|i| self.lowest(i))
    }

    pub fn overlay(&self) -> Option<&OverlayColumns> {
        self.overlay.as_ref()
    }

    pub fn fast_ma_series(&self) -> &[f64] {
        &self.fast_ma
    }

    pub fn slow_ma_series(&self) -> &[f64] {
        &self.slow_ma
    }

    pub fn lowest_series(&self) -> &[f64] {
        &self.lowest
    }

    /// True if any column of any row holds a value.
    pub fn has_defined_values(&self) -> bool {
        let overlay = self.overlay.iter().flat_map(|o| {
            o.close
                .iter()
                .chain(o.fast_ma.iter())
                .chain(o.slow_ma.iter())
        });
        self.fast_ma
            .iter()
            .chain(self.slow_ma.iter())
            .chain(self.lowest.iter())
            .chain(overlay)
            .any(|v| !v.is_nan())
    }
}

fn defined(value: Option<&f64>) -> Option<f64> {
    value.copied().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HigherTimeframe;
    use crate::indicators::ema::ema_of_series;
    use crate::indicators::make_candles;

    fn small_config() -> StrategyConfig {
        StrategyConfig {
            timeframe: Timeframe::ONE_HOUR,
            fast_period: 3,
            slow_period: 5,
            min_price_period: 4,
            startup_candle_count: 0,
            ..StrategyConfig::default()
        }
    }

    fn series_of(closes: &[f64]) -> Series {
        Series::from_candles("ETH/USDT", Timeframe::ONE_HOUR, make_candles(closes)).unwrap()
    }

    #[test]
    fn columns_match_raw_indicators_after_warmup() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let config = small_config();
        let frame = IndicatorFrame::compute(&series_of(&closes), &config).unwrap();

        assert_eq!(frame.len(), 20);
        assert_eq!(frame.startup_count(), 5);
        let fast = ema_of_series(&closes, 3);
        for i in 0..20 {
            if i < 4 {
                assert_eq!(frame.fast_ma(i), None, "masked row {i}");
            } else {
                assert_eq!(frame.fast_ma(i), Some(fast[i]));
            }
        }
        assert!(frame.overlay().is_none());
    }

    #[test]
    fn extend_appends_without_rewriting() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let config = small_config();
        let full = series_of(&closes);

        let mut partial = Series::new("ETH/USDT", Timeframe::ONE_HOUR);
        for c in &full.candles()[..12] {
            partial.push(*c).unwrap();
        }
        let mut frame = IndicatorFrame::compute(&partial, &config).unwrap();
        let before: Vec<f64> = frame.fast_ma_series().to_vec();

        let added = frame.extend(&full, &config).unwrap();
        assert_eq!(added, 18);
        assert_eq!(&frame.fast_ma_series()[..12], &before[..]);

        let batch = IndicatorFrame::compute(&full, &config).unwrap();
        assert_eq!(frame.fast_ma_series(), batch.fast_ma_series());
        assert_eq!(frame.lowest_series(), batch.lowest_series());
        assert_eq!(frame.extend(&full, &config).unwrap(), 0);
    }

    #[test]
    fn extend_rejects_other_config() {
        let config = small_config();
        let series = series_of(&[1.0, 2.0, 3.0]);
        let mut frame = IndicatorFrame::compute(&series, &config).unwrap();
        let other = StrategyConfig {
            min_price_period: 7,
            ..small_config()
        };
        assert!(matches!(
            frame.extend(&series, &other),
            Err(FrameError::ConfigMismatch { .. })
        ));
    }

    #[test]
    fn extend_rejects_shorter_or_diverged_history() {
        let config = small_config();
        let series = series_of(&[1.0, 2.0, 3.0, 4.0]);
        let mut frame = IndicatorFrame::compute(&series, &config).unwrap();

        let shorter = series_of(&[1.0, 2.0]);
        assert_eq!(
            frame.extend(&shorter, &config),
            Err(FrameError::SeriesShorter { series: 2, frame: 4 })
        );

        let shifted: Vec<Candle> = make_candles(&[1.0, 2.0, 3.0, 4.0, 5.0])
            .into_iter()
            .map(|mut c| {
                c.timestamp += chrono::Duration::minutes(30);
                c
            })
            .collect();
        let diverged = Series::from_candles("ETH/USDT", Timeframe::ONE_HOUR, shifted).unwrap();
        assert_eq!(
            frame.extend(&diverged, &config),
            Err(FrameError::HistoryDiverged { index: 3 })
        );
    }

    #[test]
    fn timeframe_must_match_config() {
        let config = small_config();
        let series =
            Series::from_candles("ETH/USDT", Timeframe::ONE_DAY, make_candles(&[1.0])).unwrap();
        assert!(matches!(
            IndicatorFrame::compute(&series, &config),
            Err(FrameError::TimeframeMismatch { .. })
        ));
    }

    #[test]
    fn overlay_columns_exist_in_multi_timeframe_mode() {
        let config = StrategyConfig {
            higher_timeframe: Some(HigherTimeframe { multiplier: 2 }),
            ..small_config()
        };
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + i as f64).collect();
        let frame = IndicatorFrame::compute(&series_of(&closes), &config).unwrap();
        let overlay = frame.overlay().unwrap();
        assert_eq!(overlay.close.len(), 40);
        // startup = (5 + 1) * 2 = 12
        assert_eq!(frame.startup_count(), 12);
        assert!(overlay.close[..11].iter().all(|v| v.is_nan()));
        assert!(frame.row(39).unwrap().overlay.unwrap().slow_ma.is_finite());
    }

    #[test]
    fn last_lowest_reads_final_row() {
        let config = small_config();
        let frame = IndicatorFrame::compute(&series_of(&[9.0, 7.0, 8.0, 6.0, 10.0]), &config).unwrap();
        // window of 4 closes ending at row 4: 7, 8, 6, 10
        assert_eq!(frame.last_lowest(), Some(6.0));
        let empty = IndicatorFrame::new(&config).unwrap();
        assert_eq!(empty.last_lowest(), None);
        assert!(!empty.has_defined_values());
    }

    #[test]
    fn unvalidated_config_is_an_error_not_a_panic() {
        let series = series_of(&[1.0, 2.0, 3.0]);
        let zero_window = StrategyConfig {
            min_price_period: 0,
            ..small_config()
        };
        assert!(matches!(
            IndicatorFrame::compute(&series, &zero_window),
            Err(FrameError::InvalidConfig(_))
        ));

        let zero_fast = StrategyConfig {
            fast_period: 0,
            ..small_config()
        };
        assert!(matches!(
            IndicatorFrame::new(&zero_fast),
            Err(FrameError::InvalidConfig(_))
        ));

        let mut frame = IndicatorFrame::compute(&series, &small_config()).unwrap();
        assert!(matches!(
            frame.extend(&series, &zero_window),
            Err(FrameError::InvalidConfig(_))
        ));
        assert_eq!(frame.len(), 3);
    }
}
