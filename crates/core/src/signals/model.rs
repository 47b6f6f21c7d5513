use breakout_market_data::Interval;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the breakout bar's volume compares to the recent average.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeKind {
    /// Three times the average or more.
    Climax,
    /// At least one and a half times the average.
    Rising,
    Steady,
}

impl VolumeKind {
    pub fn from_multiple(multiple: Decimal) -> Self {
        if multiple >= Decimal::from(3) {
            Self::Climax
        } else if multiple >= Decimal::new(15, 1) {
            Self::Rising
        } else {
            Self::Steady
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Climax => "CLIMAX",
            Self::Rising => "RISING",
            Self::Steady => "STEADY",
        }
    }
}

/// Entry, stop and targets derived from ATR.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPlan {
    pub entry: Decimal,
    pub atr: Decimal,
    /// Two ATRs below entry.
    pub stop: Decimal,
    pub stop_distance_pct: Decimal,
    /// Two, three and five ATRs above entry.
    pub targets: [Decimal; 3],
    pub risk_reward: Decimal,
}

impl RiskPlan {
    pub fn from_atr(entry: Decimal, atr: Decimal) -> Self {
        let stop = entry - atr * Decimal::TWO;
        let stop_distance_pct = if entry.is_zero() {
            Decimal::ZERO
        } else {
            (entry - stop) / entry * Decimal::ONE_HUNDRED
        };
        let targets = [
            entry + atr * Decimal::TWO,
            entry + atr * Decimal::from(3),
            entry + atr * Decimal::from(5),
        ];
        let risk = entry - stop;
        let risk_reward = if risk > Decimal::ZERO {
            (targets[0] - entry) / risk
        } else {
            Decimal::ZERO
        };
        Self {
            entry,
            atr,
            stop,
            stop_distance_pct,
            targets,
            risk_reward,
        }
    }
}

/// A detected breakout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub symbol: String,
    pub interval: Interval,
    /// Set by the scanner; detectors don't know which tier they serve.
    pub tier: Option<String>,
    /// Close of the breakout bar.
    pub price: Decimal,
    /// Open time of the breakout bar.
    pub time: DateTime<Utc>,
    /// Height of the consolidation range as a percentage of `price`.
    pub range_pct: Decimal,
    /// Breakout bar volume over the average volume.
    pub volume_multiple: Decimal,
    pub volume_kind: VolumeKind,
    pub risk: RiskPlan,
    /// Overall strength, 0 to 100.
    pub strength: u8,
}

impl Signal {
    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }
}
