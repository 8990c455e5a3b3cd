//! ActionZone Runner: drives the strategy core tick by tick for many pairs.
//!
//! This crate builds on `actionzone-core` to provide:
//! - `PairState`: a pair's series with its indicator and signal frames,
//!   extended incrementally as candles arrive
//! - `PairRunner`: pair registry, single and batched (parallel) ticks, and
//!   the stake/stop-loss hooks evaluated against the last analyzed row

pub mod pair;
pub mod runner;

pub use pair::{PairState, PushError};
pub use runner::{PairError, PairRunner};
