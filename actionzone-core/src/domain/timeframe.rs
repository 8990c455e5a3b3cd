//! Timeframe: candle width in whole minutes, parsed from host notation.
//!
//! Accepted forms: `<count><unit>` with unit `m`, `h`, `d` or `w` (e.g. `15m`,
//! `4h`, `1d`). Display picks the largest unit that divides exactly, so
//! `4h * 360` renders as `60d`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;
const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("invalid timeframe '{0}': expected <count><unit> with unit m, h, d or w")]
    Invalid(String),
    #[error("timeframe must be at least one minute")]
    Zero,
    #[error("timeframe overflows the supported range")]
    Overflow,
}

/// Width of one candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    minutes: u32,
}

impl Timeframe {
    pub const ONE_HOUR: Self = Self {
        minutes: MINUTES_PER_HOUR,
    };
    pub const FOUR_HOURS: Self = Self {
        minutes: 4 * MINUTES_PER_HOUR,
    };
    pub const ONE_DAY: Self = Self {
        minutes: MINUTES_PER_DAY,
    };

    pub fn from_minutes(minutes: u32) -> Result<Self, TimeframeError> {
        if minutes == 0 {
            return Err(TimeframeError::Zero);
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> i64 {
        i64::from(self.minutes) * 60
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }

    /// A coarser timeframe `multiplier` times as wide.
    pub fn scaled(&self, multiplier: u32) -> Result<Self, TimeframeError> {
        let minutes = self
            .minutes
            .checked_mul(multiplier)
            .ok_or(TimeframeError::Overflow)?;
        Self::from_minutes(minutes)
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || TimeframeError::Invalid(s.to_string());

        let unit = s.chars().last().ok_or_else(invalid)?;
        let count: u32 = s[..s.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;

        let scale = match unit {
            'm' => 1,
            'h' => MINUTES_PER_HOUR,
            'd' => MINUTES_PER_DAY,
            'w' => MINUTES_PER_WEEK,
            _ => return Err(invalid()),
        };

        let minutes = count.checked_mul(scale).ok_or(TimeframeError::Overflow)?;
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.minutes;
        if m % MINUTES_PER_WEEK == 0 {
            write!(f, "{}w", m / MINUTES_PER_WEEK)
        } else if m % MINUTES_PER_DAY == 0 {
            write!(f, "{}d", m / MINUTES_PER_DAY)
        } else if m % MINUTES_PER_HOUR == 0 {
            write!(f, "{}h", m / MINUTES_PER_HOUR)
        } else {
            write!(f, "{m}m")
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}
