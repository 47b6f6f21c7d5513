//! Symbol universe and scan tiers.
//!
//! Tiers come either from the built-in lists or from a JSON file with the
//! same shape as [`Tier`].

mod lists;
mod model;

pub use model::{default_tiers, fast_1m, intraday_5m, swing_15m, Tier};

use std::collections::HashSet;

use crate::errors::{Error, Result};

/// Check a tier set before scheduling it.
///
/// Names must be unique and every tier needs at least one symbol.
pub fn validate_tiers(tiers: &[Tier]) -> Result<()> {
    if tiers.is_empty() {
        return Err(Error::InvalidConfig("no tiers configured".to_string()));
    }
    let mut seen = HashSet::new();
    for tier in tiers {
        if !seen.insert(tier.name.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "duplicate tier name '{}'",
                tier.name
            )));
        }
        if tier.symbols.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "tier '{}' has no symbols",
                tier.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakout_market_data::Interval;
    use std::time::Duration;

    #[test]
    fn test_default_tiers_are_sorted_and_unique() {
        let tiers = default_tiers();
        assert_eq!(tiers.len(), 3);
        validate_tiers(&tiers).unwrap();

        for tier in &tiers {
            let mut sorted = tier.symbols.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted, tier.symbols, "tier {}", tier.name);
        }

        let fast = &tiers[0];
        assert_eq!(fast.interval, Interval::OneMinute);
        assert_eq!(fast.cadence(), Duration::from_secs(60));
        assert!(fast.symbols.contains(&"SPY".to_string()));
        // Only the first 20 mid caps make the fast tier.
        assert!(fast.symbols.contains(&"BE".to_string()));
        assert!(!fast.symbols.contains(&"DKNG".to_string()));
    }

    #[test]
    fn test_tier_json_shape() {
        let json = r#"{"name": "watch", "interval": "5min", "cadenceSecs": 120, "symbols": ["AAPL", "AMD"]}"#;
        let tier: Tier = serde_json::from_str(json).unwrap();
        assert_eq!(tier.interval, Interval::FiveMinutes);
        assert_eq!(tier.cadence(), Duration::from_secs(120));
        assert_eq!(tier.description, "");
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_tiers() {
        let a = Tier::new("a", Interval::OneMinute, Duration::from_secs(60), vec!["AAPL".into()]);
        let empty = Tier::new("b", Interval::OneMinute, Duration::from_secs(60), Vec::new());

        assert!(validate_tiers(&[a.clone(), a.clone()]).is_err());
        assert!(validate_tiers(&[a.clone(), empty]).is_err());
        assert!(validate_tiers(&[]).is_err());
        assert!(validate_tiers(&[a]).is_ok());
    }
}
