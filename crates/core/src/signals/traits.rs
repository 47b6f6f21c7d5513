use breakout_market_data::{Candle, Interval};

use super::model::Signal;

/// A pure breakout rule over a candle window.
///
/// Implementations must be deterministic and keep no state between calls;
/// the same candles always yield the same answer.
pub trait BreakoutDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// `candles` are chronological, oldest first. `None` when the latest bar
    /// is not a breakout or there is not enough history.
    fn detect(&self, symbol: &str, interval: Interval, candles: &[Candle]) -> Option<Signal>;
}
