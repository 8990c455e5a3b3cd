//! Domain types: candles, candle series and timeframes.

pub mod candle;
pub mod series;
pub mod timeframe;

pub use candle::{Candle, PriceSource};
pub use series::{Series, SeriesError};
pub use timeframe::{Timeframe, TimeframeError};
