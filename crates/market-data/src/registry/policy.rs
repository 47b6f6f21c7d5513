//! Fetch policy: retry, accounting and cache lifetime settings.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{Interval, ProviderQuota};

/// Which provider calls count against the daily budget.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageAccounting {
    /// Only calls that produced usable candles.
    #[default]
    SuccessOnly,
    /// Every request that reached a provider, failed or not.
    EveryAttempt,
}

#[derive(Clone, Debug)]
pub struct FetchPolicy {
    /// Extra attempts on the same provider after a timeout or transient error.
    pub transient_retries: u32,
    /// Pause before each of those extra attempts.
    pub retry_delay: Duration,
    pub accounting: UsageAccounting,
    /// Wait for a per-minute slot. When false a full window skips the
    /// provider instead.
    pub wait_for_slot: bool,
    /// Keep only the newest N bars of a response. Zero keeps all.
    pub max_candles: usize,
    /// Cache lifetime per interval, replacing the interval default.
    pub ttl_overrides: HashMap<Interval, Duration>,
    /// Quotas replacing a provider's built-in ones, keyed by provider id.
    pub quota_overrides: HashMap<String, ProviderQuota>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            transient_retries: 1,
            retry_delay: Duration::from_millis(500),
            accounting: UsageAccounting::default(),
            wait_for_slot: true,
            max_candles: 120,
            ttl_overrides: HashMap::new(),
            quota_overrides: HashMap::new(),
        }
    }
}

impl FetchPolicy {
    pub fn ttl_for(&self, interval: Interval) -> Duration {
        self.ttl_overrides
            .get(&interval)
            .copied()
            .unwrap_or_else(|| interval.default_cache_ttl())
    }

    pub fn quota_for(&self, provider: &str, built_in: ProviderQuota) -> ProviderQuota {
        self.quota_overrides
            .get(provider)
            .copied()
            .unwrap_or(built_in)
    }
}
