//! Consolidation breakout with volume and trend confirmation.
//!
//! The latest bar is a breakout when all of these hold:
//! - the previous `lookback` bars traded in a range no taller than
//!   `max_range_pct` of the latest close
//! - the latest close is above that range's high, on a bullish bar
//! - the latest volume is at least `volume_multiplier` times the average of
//!   the last `volume_length` bars, and that average is at least
//!   `min_avg_volume`
//! - EMA20 > EMA50 > EMA200 and the close is above EMA20 (the long EMA uses
//!   the whole series when it is shorter than 200 bars)

use breakout_market_data::{Candle, Interval};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::indicators::{atr, ema, mean};
use super::model::{RiskPlan, Signal, VolumeKind};
use super::traits::BreakoutDetector;

const MIN_HISTORY: usize = 50;
const ATR_PERIOD: usize = 14;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub lookback: usize,
    pub volume_length: usize,
    pub volume_multiplier: Decimal,
    pub max_range_pct: Decimal,
    pub min_avg_volume: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            volume_length: 20,
            volume_multiplier: Decimal::TWO,
            max_range_pct: Decimal::from(3),
            min_avg_volume: Decimal::from(100_000),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WyckoffBreakoutDetector {
    config: DetectorConfig,
}

impl WyckoffBreakoutDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn min_candles(&self) -> usize {
        (self.config.lookback + 1)
            .max(self.config.volume_length + 1)
            .max(MIN_HISTORY)
    }
}

impl BreakoutDetector for WyckoffBreakoutDetector {
    fn name(&self) -> &'static str {
        "wyckoff"
    }

    fn detect(&self, symbol: &str, interval: Interval, candles: &[Candle]) -> Option<Signal> {
        let cfg = &self.config;
        let n = candles.len();
        if n < self.min_candles() {
            return None;
        }

        let last = &candles[n - 1];
        if last.close.is_zero() {
            return None;
        }

        let base = &candles[n - 1 - cfg.lookback..n - 1];
        let range_high = base.iter().map(|c| c.high).max()?;
        let range_low = base.iter().map(|c| c.low).min()?;
        let range_pct = (range_high - range_low) / last.close * Decimal::ONE_HUNDRED;

        let volumes: Vec<Decimal> = candles[n - cfg.volume_length..]
            .iter()
            .map(|c| c.volume)
            .collect();
        let avg_volume = mean(&volumes)?;
        if avg_volume < cfg.min_avg_volume {
            return None;
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let ema20 = ema(&closes, 20)?;
        let ema50 = ema(&closes, 50)?;
        let ema200 = ema(&closes, 200.min(n))?;

        let consolidating = range_pct <= cfg.max_range_pct;
        let volume_spike = last.volume >= cfg.volume_multiplier * avg_volume;
        let breaks_range = last.close > range_high;
        let trend_ok = last.close > ema20 && ema20 > ema50 && ema50 > ema200;

        if !(consolidating && volume_spike && breaks_range && last.is_bullish() && trend_ok) {
            return None;
        }

        let volume_multiple = last.volume.checked_div(avg_volume)?;
        let risk = RiskPlan::from_atr(last.close, atr(candles, ATR_PERIOD)?);
        let strength = strength_score(candles, volume_multiple, range_pct, risk.risk_reward);
        debug!(
            "{} {}: breakout at {} (range {:.2}%, volume {:.1}x, strength {})",
            symbol, interval, last.close, range_pct, volume_multiple, strength
        );

        Some(Signal {
            symbol: symbol.to_string(),
            interval,
            tier: None,
            price: last.close,
            time: last.timestamp,
            range_pct,
            volume_multiple,
            volume_kind: VolumeKind::from_multiple(volume_multiple),
            risk,
            strength,
        })
    }
}

/// Effort-versus-result score of the last 20 bars, 0 to 10.
///
/// Heavy volume on a wide bar is strong, heavy volume on a narrow bar is
/// absorption. Rising volume across the window adds a point.
fn volume_price_score(candles: &[Candle], volume_multiple: Decimal) -> Decimal {
    let five = Decimal::from(5);
    if candles.len() < 20 {
        return five;
    }
    let recent = &candles[candles.len() - 20..];
    let last = &recent[19];

    let prior_ranges: Vec<Decimal> = recent[..19].iter().map(|c| c.high - c.low).collect();
    let avg_range = mean(&prior_ranges).unwrap_or_default();
    let bar_range = last.high - last.low;

    let mut score = if volume_multiple >= Decimal::TWO {
        if bar_range > avg_range * Decimal::new(15, 1) {
            Decimal::from(8)
        } else if bar_range < avg_range * Decimal::new(7, 1) {
            Decimal::from(3)
        } else {
            five
        }
    } else {
        five
    };

    let early: Vec<Decimal> = recent[..10].iter().map(|c| c.volume).collect();
    let late: Vec<Decimal> = recent[10..].iter().map(|c| c.volume).collect();
    let (early, late) = (
        mean(&early).unwrap_or_default(),
        mean(&late).unwrap_or_default(),
    );
    if late > early * Decimal::new(13, 1) {
        score += Decimal::ONE;
    } else if late < early * Decimal::new(7, 1) {
        score -= Decimal::ONE;
    }

    score.clamp(Decimal::ZERO, Decimal::TEN)
}

fn strength_score(
    candles: &[Candle],
    volume_multiple: Decimal,
    range_pct: Decimal,
    risk_reward: Decimal,
) -> u8 {
    let mut score = Decimal::from(50);
    score += (volume_price_score(candles, volume_multiple) - Decimal::from(5)) * Decimal::TWO;

    score += if volume_multiple >= Decimal::from(3) {
        Decimal::from(20)
    } else if volume_multiple >= Decimal::TWO {
        Decimal::from(15)
    } else if volume_multiple >= Decimal::new(15, 1) {
        Decimal::TEN
    } else {
        Decimal::ZERO
    };

    score += if range_pct <= Decimal::ONE {
        Decimal::from(15)
    } else if range_pct <= Decimal::TWO {
        Decimal::TEN
    } else if range_pct <= Decimal::from(3) {
        Decimal::from(5)
    } else {
        Decimal::ZERO
    };

    score += if risk_reward >= Decimal::from(3) {
        Decimal::from(15)
    } else if risk_reward >= Decimal::TWO {
        Decimal::TEN
    } else if risk_reward >= Decimal::new(15, 1) {
        Decimal::from(5)
    } else {
        Decimal::ZERO
    };

    let clamped = score.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).round();
    clamped.to_u8().unwrap_or(100)
}
