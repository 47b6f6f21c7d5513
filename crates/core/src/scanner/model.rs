use breakout_market_data::Interval;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::signals::Signal;

/// Why a selected symbol produced no verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of one tier scan.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub tier: String,
    pub interval: Interval,
    pub started_at: DateTime<Utc>,
    /// Remaining call budget seen at the start of the scan.
    pub budget: u32,
    /// Symbols in the tier.
    pub candidates: usize,
    /// Symbols the budget allowed, in scan order.
    pub selected: Vec<String>,
    /// Symbols whose candles reached the detector.
    pub scanned: usize,
    pub skipped: Vec<SkippedSymbol>,
    pub signals: Vec<Signal>,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
}

impl ScanReport {
    pub fn new(tier: impl Into<String>, interval: Interval, started_at: DateTime<Utc>) -> Self {
        Self {
            tier: tier.into(),
            interval,
            started_at,
            budget: 0,
            candidates: 0,
            selected: Vec::new(),
            scanned: 0,
            skipped: Vec::new(),
            signals: Vec::new(),
            alerts_sent: 0,
            alerts_failed: 0,
        }
    }

    /// True when the budget allowed nothing to be scanned.
    pub fn budget_exhausted(&self) -> bool {
        self.candidates > 0 && self.selected.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "[{}] scanned {}/{} selected of {} symbols, {} skipped, {} signals ({} alerts sent, {} failed)",
            self.tier,
            self.scanned,
            self.selected.len(),
            self.candidates,
            self.skipped.len(),
            self.signals.len(),
            self.alerts_sent,
            self.alerts_failed
        )
    }
}
