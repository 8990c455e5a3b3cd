//! Lowest: rolling minimum of one price column over a trailing window.
//!
//! lowest[t] = min(price[t-period+1..=t]), price = close (default) or low.
//! The first `period - 1` outputs are NaN.

use std::collections::VecDeque;

/// Streaming rolling minimum over a monotonic deque.
///
/// Each value enters and leaves the deque once, so `update` is amortized O(1).
/// A non-finite value makes every window that contains it NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingMin {
    period: usize,
    seen: usize,
    /// (index, value) pairs with strictly increasing values front to back.
    window: VecDeque<(usize, f64)>,
    last_non_finite: Option<usize>,
}

impl RollingMin {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RollingMin period must be >= 1");
        Self {
            period,
            seen: 0,
            window: VecDeque::with_capacity(period),
            last_non_finite: None,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let index = self.seen;
        self.seen += 1;

        if value.is_finite() {
            while self.window.back().is_some_and(|&(_, v)| v >= value) {
                self.window.pop_back();
            }
            self.window.push_back((index, value));
        } else {
            self.last_non_finite = Some(index);
        }

        while self
            .window
            .front()
            .is_some_and(|&(i, _)| i + self.period <= index)
        {
            self.window.pop_front();
        }

        if self.seen < self.period {
            return f64::NAN;
        }
        if self
            .last_non_finite
            .is_some_and(|i| i + self.period > index)
        {
            return f64::NAN;
        }
        self.window.front().map_or(f64::NAN, |&(_, v)| v)
    }
}
