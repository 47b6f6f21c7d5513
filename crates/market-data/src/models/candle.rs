use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Bring a provider response into canonical series shape.
///
/// Sorts by timestamp ascending, collapses duplicate timestamps (the later
/// row in provider order wins) and keeps only the newest `limit` bars.
/// A `limit` of zero keeps everything.
pub fn normalize_series(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    // Stable sort keeps provider order among equal timestamps.
    candles.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut series: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match series.last_mut() {
            Some(prev) if prev.timestamp == candle.timestamp => *prev = candle,
            _ => series.push(candle),
        }
    }

    if limit > 0 && series.len() > limit {
        series.drain(..series.len() - limit);
    }

    series
}
