//! Signal classification: entry/exit flags per row.
//!
//! The classifier is memoryless: each row's flags depend only on that row's
//! candle and indicator values. Comparisons are strict, and any undefined
//! (NaN) operand makes its comparison false, so warm-up rows never fire.

use serde::Serialize;

use crate::domain::{Candle, Series};
use crate::frame::{IndicatorFrame, IndicatorRow};
use crate::indicators::OverlayValues;

/// Flags of a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalRow {
    pub enter_long: bool,
    pub exit_long: bool,
}

impl SignalRow {
    pub const NONE: Self = Self {
        enter_long: false,
        exit_long: false,
    };
}

/// Classify one row.
pub fn classify_row(candle: &Candle, row: &IndicatorRow) -> SignalRow {
    let has_volume = candle.volume > 0.0;

    let base_up = row.fast_ma > row.slow_ma && candle.close > row.fast_ma;
    let base_down = row.fast_ma < row.slow_ma && candle.close < row.fast_ma;

    let (overlay_up, overlay_down) = match row.overlay {
        Some(overlay) => (trending_up(&overlay), trending_down(&overlay)),
        None => (true, true),
    };

    SignalRow {
        enter_long: has_volume && base_up && overlay_up,
        exit_long: has_volume && base_down && overlay_down,
    }
}

fn trending_up(o: &OverlayValues) -> bool {
    o.fast_ma > o.slow_ma && o.close > o.fast_ma
}

fn trending_down(o: &OverlayValues) -> bool {
    o.fast_ma < o.slow_ma && o.close < o.fast_ma
}

/// Entry/exit columns aligned with an `IndicatorFrame`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalFrame {
    enter_long: Vec<bool>,
    exit_long: Vec<bool>,
}

impl SignalFrame {
    /// Classify every row the frame covers.
    pub fn classify(series: &Series, frame: &IndicatorFrame) -> Self {
        let mut signals = Self::default();
        signals.extend(series, frame);
        signals
    }

    /// Classify rows the frame covers that are not yet classified.
    /// Returns the number of rows added.
    pub fn extend(&mut self, series: &Series, frame: &IndicatorFrame) -> usize {
        let start = self.len();
        let end = frame.len().min(series.len());

        for (i, candle) in series.candles()[start.min(end)..end].iter().enumerate() {
            let signal = frame
                .row(start + i)
                .map(|row| classify_row(candle, &row))
                .unwrap_or(SignalRow::NONE);
            self.enter_long.push(signal.enter_long);
            self.exit_long.push(signal.exit_long);
        }
        end.saturating_sub(start)
    }

    pub fn len(&self) -> usize {
        self.enter_long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enter_long.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SignalRow> {
        Some(SignalRow {
            enter_long: *self.enter_long.get(index)?,
            exit_long: *self.exit_long.get(index)?,
        })
    }

    /// Flags of the last classified row; what the host reads on each tick.
    pub fn latest(&self) -> Option<SignalRow> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn enter_long(&self) -> &[bool] {
        &self.enter_long
    }

    pub fn exit_long(&self) -> &[bool] {
        &self.exit_long
    }

    /// Index of the first row with `enter_long` set.
    pub fn first_entry(&self) -> Option<usize> {
        self.enter_long.iter().position(|&e| e)
    }
}
