//! Higher-timeframe resampling and the no-lookahead overlay.
//!
//! Base candles are grouped into buckets aligned to the Unix epoch:
//! open = first, high = max, low = min, close = last, volume = sum. Buckets
//! with no base candles do not exist.
//!
//! A bucket closes at `start + width`. Its values become visible to a base
//! row only when that row's timestamp is at or past the close, and are held
//! until the next bucket closes. A bucket still open at row t is never seen
//! by row t.

use chrono::{DateTime, Duration, Utc};

use super::ema::EmaState;
use crate::domain::{Candle, Timeframe};

/// Start of the epoch-aligned bucket containing `timestamp`.
pub fn bucket_start(timestamp: DateTime<Utc>, bucket: Timeframe) -> DateTime<Utc> {
    let offset = timestamp.timestamp().rem_euclid(bucket.seconds());
    timestamp
        - Duration::seconds(offset)
        - Duration::nanoseconds(i64::from(timestamp.timestamp_subsec_nanos()))
}

/// Streaming bucket aggregator.
#[derive(Debug, Clone, PartialEq)]
struct Resampler {
    bucket: Timeframe,
    open: Option<Candle>,
}

impl Resampler {
    fn new(bucket: Timeframe) -> Self {
        Self { bucket, open: None }
    }

    /// Feed the next base candle (timestamps must increase).
    ///
    /// Returns the previous bucket if this candle belongs to a later one,
    /// i.e. the bucket that just closed.
    fn push(&mut self, candle: &Candle) -> Option<Candle> {
        let start = bucket_start(candle.timestamp, self.bucket);

        if let Some(current) = self.open.as_mut() {
            if current.timestamp == start {
                current.high = current.high.max(candle.high);
                current.low = current.low.min(candle.low);
                current.close = candle.close;
                current.volume += candle.volume;
                return None;
            }
        }

        self.open.replace(Candle {
            timestamp: start,
            ..*candle
        })
    }
}

/// Higher-timeframe values as seen from one base row. NaN = not yet available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayValues {
    pub close: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
}

impl OverlayValues {
    pub const UNDEFINED: Self = Self {
        close: f64::NAN,
        fast_ma: f64::NAN,
        slow_ma: f64::NAN,
    };
}

/// Streaming overlay: resampler + fast/slow EMA over closed bucket closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    resampler: Resampler,
    fast: EmaState,
    slow: EmaState,
    latest: OverlayValues,
    closed_buckets: usize,
}

impl Overlay {
    pub fn new(bucket: Timeframe, fast_period: usize, slow_period: usize) -> Self {
        Self {
            resampler: Resampler::new(bucket),
            fast: EmaState::new(fast_period),
            slow: EmaState::new(slow_period),
            latest: OverlayValues::UNDEFINED,
            closed_buckets: 0,
        }
    }

    /// Feed the next base candle and return the overlay visible at it.
    pub fn push(&mut self, candle: &Candle) -> OverlayValues {
        if let Some(closed) = self.resampler.push(candle) {
            self.closed_buckets += 1;
            self.latest = OverlayValues {
                close: closed.close,
                fast_ma: self.fast.update(closed.close),
                slow_ma: self.slow.update(closed.close),
            };
        }
        self.latest
    }

    /// Number of buckets that have closed so far.
    pub fn closed_buckets(&self) -> usize {
        self.closed_buckets
    }
}
