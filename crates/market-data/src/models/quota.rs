use serde::{Deserialize, Serialize};

/// Static per-provider call budget and fallback position.
///
/// Loaded once at startup and never changed afterwards. A `None` limit
/// means the provider is not metered on that axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuota {
    /// Maximum calls per calendar day.
    pub daily_limit: Option<u32>,

    /// Maximum calls in any sliding 60-second window.
    pub per_minute_limit: Option<u32>,

    /// Position in the fallback chain. Lower values are tried first.
    pub priority_rank: u8,
}

impl ProviderQuota {
    pub const fn metered(daily_limit: u32, per_minute_limit: u32, priority_rank: u8) -> Self {
        Self {
            daily_limit: Some(daily_limit),
            per_minute_limit: Some(per_minute_limit),
            priority_rank,
        }
    }

    pub const fn unmetered(priority_rank: u8) -> Self {
        Self {
            daily_limit: None,
            per_minute_limit: None,
            priority_rank,
        }
    }

    /// Whether calls to this provider draw from a daily budget.
    pub fn is_metered(&self) -> bool {
        self.daily_limit.is_some()
    }
}
