use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Candle interval requested from providers.
///
/// The serde form (`"1min"`, `"5min"`, ...) is also the canonical name used
/// in cache keys and configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1h", alias = "1hour")]
    OneHour,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::ThirtyMinutes => "30min",
            Self::OneHour => "1h",
        }
    }

    /// Length of one bar.
    pub fn bar_duration(&self) -> Duration {
        let minutes = match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
        };
        Duration::from_secs(minutes * 60)
    }

    /// Default cache lifetime for a series of this interval.
    ///
    /// Tracks the cadence at which new bars appear: a 1-minute series is
    /// worth re-fetching after a minute, a 15-minute series after ten.
    pub fn default_cache_ttl(&self) -> Duration {
        let secs = match self {
            Self::OneMinute => 60,
            Self::FiveMinutes => 180,
            Self::FifteenMinutes => 600,
            Self::ThirtyMinutes => 1200,
            Self::OneHour => 1800,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1min" | "1m" => Ok(Self::OneMinute),
            "5min" | "5m" => Ok(Self::FiveMinutes),
            "15min" | "15m" => Ok(Self::FifteenMinutes),
            "30min" | "30m" => Ok(Self::ThirtyMinutes),
            "1h" | "1hour" | "60min" => Ok(Self::OneHour),
            other => Err(MarketDataError::InvalidInterval(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("1min".parse::<Interval>().unwrap(), Interval::OneMinute);
        assert_eq!("5m".parse::<Interval>().unwrap(), Interval::FiveMinutes);
        assert_eq!("1hour".parse::<Interval>().unwrap(), Interval::OneHour);
        assert_eq!(" 15MIN ".parse::<Interval>().unwrap(), Interval::FifteenMinutes);
        assert!("2min".parse::<Interval>().is_err());
    }

    #[test]
    fn test_ttl_grows_with_interval() {
        let ttls: Vec<_> = Interval::ALL.iter().map(|i| i.default_cache_ttl()).collect();
        assert!(ttls.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Interval::OneMinute.default_cache_ttl(), Duration::from_secs(60));
        assert_eq!(Interval::FifteenMinutes.default_cache_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Interval::OneHour).unwrap();
        assert_eq!(json, "\"1h\"");
        let parsed: Interval = serde_json::from_str("\"1hour\"").unwrap();
        assert_eq!(parsed, Interval::OneHour);
    }
}
