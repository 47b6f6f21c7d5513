//! Moving-average and volatility helpers over `Decimal` series.

use breakout_market_data::Candle;
use rust_decimal::Decimal;

/// Exponential moving average of the last `period` values.
///
/// Seeded with the value `period` bars back, then smoothed with
/// `k = 2 / (period + 1)` up to the latest value. Shorter series return
/// their last value.
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    let last = *values.last()?;
    if period == 0 || values.len() < period {
        return Some(last);
    }
    let k = Decimal::TWO / Decimal::from(period + 1);
    let window = &values[values.len() - period..];
    let seed = window[0];
    Some(
        window[1..]
            .iter()
            .fold(seed, |acc, v| *v * k + acc * (Decimal::ONE - k)),
    )
}

/// Simple average. `None` for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

/// Average true range over the last `period` bars.
///
/// With fewer than `period + 1` candles this falls back to the average
/// high-low range of what is there.
pub fn atr(candles: &[Candle], period: usize) -> Option<Decimal> {
    if candles.is_empty() || period == 0 {
        return None;
    }
    if candles.len() < period + 1 {
        let ranges: Vec<Decimal> = candles.iter().map(|c| c.high - c.low).collect();
        return mean(&ranges);
    }
    let true_ranges: Vec<Decimal> = candles
        .windows(2)
        .map(|pair| {
            let (prev, bar) = (&pair[0], &pair[1]);
            (bar.high - bar.low)
                .max((bar.high - prev.close).abs())
                .max((bar.low - prev.close).abs())
        })
        .collect();
    mean(&true_ranges[true_ranges.len() - period..])
}
