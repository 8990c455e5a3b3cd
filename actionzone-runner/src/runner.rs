//! Multi-pair runner: per-tick driver around one `ActionZone` strategy.
//!
//! Each registered pair owns an independent `PairState`. A tick appends one
//! candle per pair, extends that pair's frames, and returns the latest
//! signals. Pairs share nothing mutable, so a batch of ticks can be applied
//! in parallel.

use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use actionzone_core::{
    ActionZone, Candle, ConfigError, SignalRow, SizingError, SizingRequest, StakeDecision,
    StopLossDecision, StopLossRequest, StrategyConfig,
};

use crate::pair::{PairState, PushError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PairError {
    #[error("pair '{0}' is not registered")]
    UnknownPair(String),
    #[error("pair '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("pair '{pair}': {source}")]
    Rejected { pair: String, source: PushError },
    #[error("sizing failed: {0}")]
    Sizing(#[from] SizingError),
}

#[derive(Debug)]
pub struct PairRunner {
    strategy: ActionZone,
    pairs: BTreeMap<String, PairState>,
    parallel: bool,
}

impl PairRunner {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            strategy: ActionZone::new(config)?,
            pairs: BTreeMap::new(),
            parallel: true,
        })
    }

    /// Enable or disable parallel batch ticks.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strategy(&self) -> &ActionZone {
        &self.strategy
    }

    pub fn register(&mut self, pair: &str) -> Result<(), PairError> {
        if self.pairs.contains_key(pair) {
            return Err(PairError::AlreadyRegistered(pair.to_string()));
        }
        let state = PairState::new(pair, &self.strategy).map_err(|e| PairError::Rejected {
            pair: pair.to_string(),
            source: PushError::Frame(e),
        })?;
        self.pairs.insert(pair.to_string(), state);
        tracing::info!(
            pair,
            timeframe = %self.strategy.config().timeframe,
            startup = self.strategy.startup_count(),
            "registered pair"
        );
        Ok(())
    }

    pub fn pairs(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    /// Load history for a pair in one go.
    pub fn backfill(
        &mut self,
        pair: &str,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Result<usize, PairError> {
        let state = self
            .pairs
            .get_mut(pair)
            .ok_or_else(|| PairError::UnknownPair(pair.to_string()))?;
        state
            .push_all(candles, &self.strategy)
            .map_err(|source| rejected(pair, source))
    }

    /// Append one candle to `pair` and return its latest signals.
    pub fn on_candle(&mut self, pair: &str, candle: Candle) -> Result<SignalRow, PairError> {
        let state = self
            .pairs
            .get_mut(pair)
            .ok_or_else(|| PairError::UnknownPair(pair.to_string()))?;
        state
            .push(candle, &self.strategy)
            .map_err(|source| rejected(pair, source))
    }

    /// Apply one candle per pair. Each pair's result is independent: an
    /// error for one pair does not affect the others.
    pub fn on_candles(
        &mut self,
        batch: BTreeMap<String, Candle>,
    ) -> BTreeMap<String, Result<SignalRow, PairError>> {
        let strategy = &self.strategy;
        let tick = |(pair, state): (&String, &mut PairState)| {
            batch.get(pair).map(|candle| {
                let result = state
                    .push(*candle, strategy)
                    .map_err(|source| rejected(pair, source));
                (pair.clone(), result)
            })
        };

        let mut results: BTreeMap<String, Result<SignalRow, PairError>> = if self.parallel {
            self.pairs.par_iter_mut().filter_map(tick).collect()
        } else {
            self.pairs.iter_mut().filter_map(tick).collect()
        };

        for pair in batch.keys() {
            if !self.pairs.contains_key(pair) {
                results.insert(pair.clone(), Err(PairError::UnknownPair(pair.clone())));
            }
        }
        results
    }

    pub fn analyzed(&self, pair: &str) -> Result<&PairState, PairError> {
        self.pairs
            .get(pair)
            .ok_or_else(|| PairError::UnknownPair(pair.to_string()))
    }

    /// Latest signals of `pair`, if it has any rows.
    pub fn latest(&self, pair: &str) -> Result<Option<SignalRow>, PairError> {
        Ok(self.analyzed(pair)?.signals().latest())
    }

    pub fn custom_stake_amount(&self, request: &SizingRequest) -> Result<StakeDecision, PairError> {
        let state = self.analyzed(&request.pair)?;
        Ok(self.strategy.custom_stake_amount(request, state.frame())?)
    }

    pub fn custom_stoploss(&self, request: &StopLossRequest) -> Result<StopLossDecision, PairError> {
        let state = self.analyzed(&request.pair)?;
        Ok(self.strategy.custom_stoploss(request, state.frame())?)
    }
}

fn rejected(pair: &str, source: PushError) -> PairError {
    tracing::warn!(pair, error = %source, "rejected candle");
    PairError::Rejected {
        pair: pair.to_string(),
        source,
    }
}
