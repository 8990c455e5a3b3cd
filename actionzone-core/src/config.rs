//! Strategy configuration, presets and fingerprinting.
//!
//! All parameters are static per strategy instance. A configuration is loaded
//! from TOML or JSON (every field has a default), validated once, and then
//! identified by a BLAKE3 fingerprint of its canonical JSON form. Frames carry
//! the fingerprint of the configuration that produced them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{PriceSource, Timeframe};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Complete, static configuration of one strategy instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    /// Base candle timeframe the series must be delivered at.
    pub timeframe: Timeframe,
    pub fast_period: usize,
    pub slow_period: usize,
    /// Window of the rolling minimum ("lowest") used as the stop reference.
    pub min_price_period: usize,
    pub lowest_source: PriceSource,
    /// Host-declared minimum history; the warm-up mask is at least this long.
    pub startup_candle_count: usize,
    /// Present only for the multi-timeframe mode.
    pub higher_timeframe: Option<HigherTimeframe>,
    pub sizing: SizingConfig,
    pub stoploss: StopLossConfig,
}

/// Resampling factor for the higher-timeframe overlay (`long_period`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HigherTimeframe {
    pub multiplier: u32,
}

/// How stakes are sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingConfig {
    /// Risk a fixed quote-currency amount between entry and `lowest`.
    FixedUsdLoss { max_loss_per_trade: f64 },
    /// Risk a fraction of the starting balance with a stop at a fixed
    /// percentage below entry (`stoploss` is negative, e.g. -0.10).
    FixedFraction { risk_fraction: f64, stoploss: f64 },
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self::FixedUsdLoss {
            max_loss_per_trade: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StopLossConfig {
    pub mode: StopLossMode,
    /// Static stoploss the host applies (-1.0 disables it in practice).
    pub static_fraction: f64,
}

impl Default for StopLossConfig {
    fn default() -> Self {
        Self {
            mode: StopLossMode::Static,
            static_fraction: -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopLossMode {
    /// Never override; the host's static stoploss applies.
    #[default]
    Static,
    /// Place the stop at `lowest` once, right after the trade opens.
    InitialLowest,
}

/// The three shipped strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Daily candles, fixed-USD-loss sizing against `lowest`.
    ActionZone,
    /// Daily candles, 2% of starting balance at risk with a 10% stop.
    ActionZoneRiskFraction,
    /// 4h candles gated by a 60-day overlay, one-shot stop at `lowest`.
    MultiActionZone,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActionZone => "action_zone",
            Self::ActionZoneRiskFraction => "action_zone_risk_fraction",
            Self::MultiActionZone => "multi_action_zone",
        }
    }

    pub fn config(&self) -> StrategyConfig {
        let base = StrategyConfig {
            timeframe: Timeframe::ONE_DAY,
            fast_period: 12,
            slow_period: 26,
            min_price_period: 32,
            lowest_source: PriceSource::Close,
            startup_candle_count: 30,
            higher_timeframe: None,
            sizing: SizingConfig::default(),
            stoploss: StopLossConfig::default(),
        };

        match self {
            Self::ActionZone => base,
            Self::ActionZoneRiskFraction => StrategyConfig {
                sizing: SizingConfig::FixedFraction {
                    risk_fraction: 0.02,
                    stoploss: -0.10,
                },
                stoploss: StopLossConfig {
                    mode: StopLossMode::Static,
                    static_fraction: -0.10,
                },
                ..base
            },
            Self::MultiActionZone => StrategyConfig {
                timeframe: Timeframe::FOUR_HOURS,
                // 4h * 360 = 60d buckets; use multiplier 6 for daily ones
                higher_timeframe: Some(HigherTimeframe { multiplier: 360 }),
                stoploss: StopLossConfig {
                    mode: StopLossMode::InitialLowest,
                    static_fraction: -1.0,
                },
                ..base
            },
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Preset::ActionZone.config()
    }
}

impl StrategyConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every rule and report all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.fast_period < 1 {
            problems.push("fast_period must be >= 1".to_string());
        }
        if self.slow_period <= self.fast_period {
            problems.push(format!(
                "slow_period ({}) must be > fast_period ({})",
                self.slow_period, self.fast_period
            ));
        }
        if self.min_price_period < 1 {
            problems.push("min_price_period must be >= 1".to_string());
        }

        if let Some(htf) = self.higher_timeframe {
            if htf.multiplier < 2 {
                problems.push(format!(
                    "higher_timeframe.multiplier must be >= 2, got {}",
                    htf.multiplier
                ));
            } else if self.timeframe.scaled(htf.multiplier).is_err() {
                problems.push(format!(
                    "higher_timeframe.multiplier {} overflows timeframe {}",
                    htf.multiplier, self.timeframe
                ));
            }
        }

        match self.sizing {
            SizingConfig::FixedUsdLoss { max_loss_per_trade } => {
                if !(max_loss_per_trade.is_finite() && max_loss_per_trade > 0.0) {
                    problems.push(format!(
                        "sizing.max_loss_per_trade must be positive, got {max_loss_per_trade}"
                    ));
                }
            }
            SizingConfig::FixedFraction {
                risk_fraction,
                stoploss,
            } => {
                if !(risk_fraction > 0.0 && risk_fraction < 1.0) {
                    problems.push(format!(
                        "sizing.risk_fraction must be in (0, 1), got {risk_fraction}"
                    ));
                }
                if !(stoploss > -1.0 && stoploss < 0.0) {
                    problems.push(format!(
                        "sizing.stoploss must be in (-1, 0), got {stoploss}"
                    ));
                }
            }
        }

        let static_fraction = self.stoploss.static_fraction;
        if !(static_fraction >= -1.0 && static_fraction < 0.0) {
            problems.push(format!(
                "stoploss.static_fraction must be in [-1, 0), got {static_fraction}"
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Timeframe of the resampled overlay buckets, if configured.
    pub fn overlay_timeframe(&self) -> Option<Timeframe> {
        self.higher_timeframe
            .and_then(|htf| self.timeframe.scaled(htf.multiplier).ok())
    }

    /// Rows before this count are masked as undefined in every frame column.
    ///
    /// The overlay needs enough base candles for `slow_period` closed buckets,
    /// which `(slow_period + 1) * multiplier` contiguous candles guarantee.
    pub fn startup_count(&self) -> usize {
        let base = [
            self.startup_candle_count,
            self.fast_period,
            self.slow_period,
            self.min_price_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        match self.higher_timeframe {
            Some(htf) => base.max((self.slow_period + 1).saturating_mul(htf.multiplier as usize)),
            None => base,
        }
    }

    /// Exact identity: hash of the canonical JSON form.
    pub fn fingerprint(&self) -> ConfigFingerprint {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let canonical = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        ConfigFingerprint(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

/// BLAKE3 hex digest identifying a `StrategyConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigFingerprint(pub String);

impl ConfigFingerprint {
    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for preset in [
            Preset::ActionZone,
            Preset::ActionZoneRiskFraction,
            Preset::MultiActionZone,
        ] {
            preset.config().validate().unwrap();
        }
    }

    #[test]
    fn preset_values_match_variants() {
        let az = Preset::ActionZone.config();
        assert_eq!(az.timeframe.to_string(), "1d");
        assert_eq!((az.fast_period, az.slow_period), (12, 26));
        assert_eq!(az.min_price_period, 32);
        assert_eq!(
            az.sizing,
            SizingConfig::FixedUsdLoss {
                max_loss_per_trade: 10.0
            }
        );

        let rf = Preset::ActionZoneRiskFraction.config();
        assert_eq!(rf.stoploss.static_fraction, -0.10);

        let multi = Preset::MultiActionZone.config();
        assert_eq!(multi.timeframe.to_string(), "4h");
        assert_eq!(multi.overlay_timeframe().unwrap().to_string(), "60d");
        assert_eq!(multi.stoploss.mode, StopLossMode::InitialLowest);
    }

    #[test]
    fn startup_count_takes_the_longest_window() {
        assert_eq!(Preset::ActionZone.config().startup_count(), 32);
        // (26 + 1) * 360
        assert_eq!(Preset::MultiActionZone.config().startup_count(), 9720);
    }

    #[test]
    fn toml_with_defaults_parses() {
        let config = StrategyConfig::from_toml_str(
            r#"
            timeframe = "4h"

            [higher_timeframe]
            multiplier = 6

            [sizing]
            type = "fixed_fraction"
            risk_fraction = 0.01
            stoploss = -0.05

            [stoploss]
            mode = "initial_lowest"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeframe.minutes(), 240);
        assert_eq!(config.fast_period, 12);
        assert_eq!(config.higher_timeframe, Some(HigherTimeframe { multiplier: 6 }));
        assert_eq!(config.stoploss.mode, StopLossMode::InitialLowest);
        assert_eq!(config.stoploss.static_fraction, -1.0);
    }

    #[test]
    fn toml_rejects_unknown_fields() {
        let err = StrategyConfig::from_toml_str("fast_periodd = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn validation_reports_every_problem() {
        let config = StrategyConfig {
            fast_period: 30,
            slow_period: 26,
            min_price_period: 0,
            higher_timeframe: Some(HigherTimeframe { multiplier: 1 }),
            sizing: SizingConfig::FixedFraction {
                risk_fraction: 1.5,
                stoploss: 0.1,
            },
            ..StrategyConfig::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid(problems)) => assert_eq!(problems.len(), 5),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn json_roundtrip_preserves_fingerprint() {
        let config = Preset::MultiActionZone.config();
        let json = serde_json::to_string(&config).unwrap();
        let back = StrategyConfig::from_json_str(&json).unwrap();
        assert_eq!(config, back);
        assert_eq!(config.fingerprint(), back.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_parameters() {
        let a = Preset::ActionZone.config();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.min_price_period = 33;
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().short().len(), 12);
    }
}
