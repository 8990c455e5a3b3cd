//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[period-1] = SMA of first `period` close values.
//! The first `period - 1` outputs are NaN.

/// Streaming EMA kernel.
///
/// Batch frame computation and incremental frame extension both run through
/// `update`, so appending values one at a time reproduces the batch output
/// bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    count: usize,
    value: f64,
    poisoned: bool,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            count: 0,
            value: f64::NAN,
            poisoned: false,
        }
    }

    /// Feed the next value. Returns NaN until `period` values have been seen.
    ///
    /// A non-finite input taints the state: every later output is NaN.
    pub fn update(&mut self, input: f64) -> f64 {
        if self.poisoned {
            return f64::NAN;
        }
        if !input.is_finite() {
            self.poisoned = true;
            self.value = f64::NAN;
            return f64::NAN;
        }

        self.count += 1;
        if self.count < self.period {
            self.seed_sum += input;
            return f64::NAN;
        }
        if self.count == self.period {
            self.seed_sum += input;
            self.value = self.seed_sum / self.period as f64;
            return self.value;
        }

        self.value = self.alpha * input + (1.0 - self.alpha) * self.value;
        self.value
    }

    /// Latest EMA value, if warmed up.
    pub fn current(&self) -> Option<f64> {
        self.is_ready().then_some(self.value)
    }

    pub fn is_ready(&self) -> bool {
        !self.poisoned && self.count >= self.period
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Raw EMA over a slice, as a reference for the streaming state.
#[cfg(test)]
pub(crate) fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let mut state = EmaState::new(period);
    values.iter().map(|&v| state.update(v)).collect()
}
