//! Provider capability descriptors.

use crate::models::Interval;

/// What a provider can serve.
///
/// Used by the fetcher to skip providers that can't handle an interval
/// before spending a rate-limit slot on them.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    pub intervals: &'static [Interval],
}

impl ProviderCapabilities {
    pub const fn all_intervals() -> Self {
        Self {
            intervals: &Interval::ALL,
        }
    }

    pub fn supports(&self, interval: Interval) -> bool {
        self.intervals.contains(&interval)
    }
}
