//! Tier definitions.

use std::collections::BTreeSet;
use std::time::Duration;

use breakout_market_data::Interval;
use serde::{Deserialize, Serialize};

use super::lists::*;

/// A named group of symbols scanned together at one interval and cadence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub interval: Interval,
    /// Seconds between scans.
    pub cadence_secs: u64,
    pub symbols: Vec<String>,
}

impl Tier {
    pub fn new(
        name: impl Into<String>,
        interval: Interval,
        cadence: Duration,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            interval,
            cadence_secs: cadence.as_secs(),
            symbols,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Scan period. Never shorter than one second.
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs.max(1))
    }
}

/// Sorted, de-duplicated union of `parts`, each taken up to its limit.
fn combine(parts: &[(&[&str], usize)]) -> Vec<String> {
    parts
        .iter()
        .flat_map(|(list, take)| list.iter().take(*take))
        .map(|s| s.to_string())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Ultra liquid stocks and ETFs on 1-minute bars.
pub fn fast_1m() -> Tier {
    let symbols = combine(&[
        (SP500_TECH, usize::MAX),
        (MAJOR_ETFS, usize::MAX),
        (SEMICONDUCTORS, 20),
        (SOFTWARE_CLOUD, 30),
        (FINTECH, 15),
        (MID_CAP_GROWTH, 20),
    ]);
    Tier::new("fast_1m", Interval::OneMinute, Duration::from_secs(60), symbols)
        .with_description("Ultra liquid stocks & ETFs scanned on 1m")
}

/// Large and mid caps on 5-minute bars.
pub fn intraday_5m() -> Tier {
    let symbols = combine(&[
        (SP500_LARGE_CAP, usize::MAX),
        (MID_CAP_GROWTH, usize::MAX),
        (SEMICONDUCTORS, usize::MAX),
        (BIOTECH_PHARMA, 40),
        (SOFTWARE_CLOUD, usize::MAX),
        (FINTECH, usize::MAX),
        (ECOMMERCE_DIGITAL, usize::MAX),
        (CYBERSECURITY, usize::MAX),
        (CLOUD_INFRA, 15),
        (AD_MEDIA, 15),
        (CONSUMER_INTERNET, 15),
        (HEALTH_TECH, 12),
    ]);
    Tier::new("intraday_5m", Interval::FiveMinutes, Duration::from_secs(300), symbols)
        .with_description("Large & mid cap stocks on 5m")
}

/// Broad market coverage on 15-minute bars.
pub fn swing_15m() -> Tier {
    let symbols = combine(&[
        (SP500_LARGE_CAP, usize::MAX),
        (BIOTECH_PHARMA, usize::MAX),
        (SOFTWARE_CLOUD, usize::MAX),
        (SEMICONDUCTORS, usize::MAX),
        (FINTECH, usize::MAX),
        (ECOMMERCE_DIGITAL, usize::MAX),
        (CYBERSECURITY, usize::MAX),
        (CLOUD_INFRA, usize::MAX),
        (AD_MEDIA, usize::MAX),
        (CONSUMER_INTERNET, usize::MAX),
        (HEALTH_TECH, usize::MAX),
    ]);
    Tier::new("swing_15m", Interval::FifteenMinutes, Duration::from_secs(900), symbols)
        .with_description("Comprehensive market coverage on 15m")
}

/// The three built-in tiers.
pub fn default_tiers() -> Vec<Tier> {
    vec![fast_1m(), intraday_5m(), swing_15m()]
}
