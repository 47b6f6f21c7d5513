use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};

use breakout_market_data::{BudgetPolicy, MarketDataError, SymbolPrioritizer};

use super::errors::ScanError;
use super::model::{ScanReport, SkippedSymbol};
use super::traits::CandleSource;
use crate::notify::{format_alert, Notifier};
use crate::signals::BreakoutDetector;
use crate::universe::Tier;

/// Runs one scan cycle for a tier: select, fetch, detect, alert.
pub struct TierScanner {
    source: Arc<dyn CandleSource>,
    detector: Arc<dyn BreakoutDetector>,
    notifier: Arc<dyn Notifier>,
    prioritizer: SymbolPrioritizer,
    budget: BudgetPolicy,
}

impl TierScanner {
    pub fn new(
        source: Arc<dyn CandleSource>,
        detector: Arc<dyn BreakoutDetector>,
        notifier: Arc<dyn Notifier>,
        prioritizer: SymbolPrioritizer,
        budget: BudgetPolicy,
    ) -> Self {
        Self {
            source,
            detector,
            notifier,
            prioritizer,
            budget,
        }
    }

    pub fn budget_policy(&self) -> &BudgetPolicy {
        &self.budget
    }

    /// Scan the symbols of `tier` that today's budget allows.
    ///
    /// Symbols without data are skipped. Only a missing provider setup
    /// aborts the scan.
    pub async fn scan_tier(&self, tier: &Tier) -> Result<ScanReport, ScanError> {
        if tier.symbols.is_empty() {
            return Err(ScanError::EmptyTier {
                tier: tier.name.clone(),
            });
        }

        let mut report = ScanReport::new(&tier.name, tier.interval, Utc::now());
        report.candidates = tier.symbols.len();
        report.budget = self.source.remaining_budget(&self.budget);
        report.selected = self.prioritizer.select_symbols(
            &tier.symbols,
            report.budget,
            self.budget.active_tiers,
        );

        if report.selected.is_empty() {
            warn!(
                "[{}] Skipping cycle: daily budget exhausted ({} remaining)",
                tier.name, report.budget
            );
            return Ok(report);
        }

        info!(
            "[{}] Scanning {}/{} symbols at {}",
            tier.name,
            report.selected.len(),
            report.candidates,
            tier.interval
        );

        for symbol in report.selected.clone() {
            let candles = match self.source.candles(&symbol, tier.interval).await {
                Ok(candles) => candles,
                Err(MarketDataError::NoProvidersAvailable) => {
                    return Err(ScanError::MarketData {
                        tier: tier.name.clone(),
                        source: MarketDataError::NoProvidersAvailable,
                    });
                }
                Err(e) => {
                    debug!("[{}] {} skipped: {}", tier.name, symbol, e);
                    report.skipped.push(SkippedSymbol {
                        symbol,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            report.scanned += 1;

            let Some(signal) = self.detector.detect(&symbol, tier.interval, &candles) else {
                continue;
            };
            let signal = signal.with_tier(&tier.name);
            info!(
                "[{}] Breakout: {} @ {} (strength {})",
                tier.name, signal.symbol, signal.price, signal.strength
            );

            match self.notifier.send(&format_alert(&signal)).await {
                Ok(()) => report.alerts_sent += 1,
                Err(e) => {
                    warn!(
                        "[{}] Alert for {} via {} failed: {}",
                        tier.name,
                        signal.symbol,
                        self.notifier.name(),
                        e
                    );
                    report.alerts_failed += 1;
                }
            }
            report.signals.push(signal);
        }

        info!("{}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{LogNotifier, NotifyError};
    use crate::signals::{RiskPlan, Signal, VolumeKind};
    use async_trait::async_trait;
    use breakout_market_data::{Candle, Interval};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StubSource {
        budget: u32,
        missing: HashSet<String>,
        no_providers: bool,
        calls: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(budget: u32) -> Self {
            Self {
                budget,
                missing: HashSet::new(),
                no_providers: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CandleSource for StubSource {
        async fn candles(
            &self,
            symbol: &str,
            interval: Interval,
        ) -> Result<Vec<Candle>, MarketDataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if self.no_providers {
                return Err(MarketDataError::NoProvidersAvailable);
            }
            if self.missing.contains(symbol) {
                return Err(MarketDataError::DataUnavailable {
                    symbol: symbol.to_string(),
                    interval,
                    attempts: Vec::new(),
                });
            }
            let ts = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
            Ok(vec![Candle::new(
                ts,
                dec!(100),
                dec!(101),
                dec!(99),
                dec!(100.5),
                dec!(1000),
            )])
        }

        fn remaining_budget(&self, _policy: &BudgetPolicy) -> u32 {
            self.budget
        }
    }

    /// Fires for a fixed set of symbols.
    struct StubDetector {
        hits: HashSet<String>,
    }

    impl BreakoutDetector for StubDetector {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn detect(&self, symbol: &str, interval: Interval, candles: &[Candle]) -> Option<Signal> {
            if !self.hits.contains(symbol) {
                return None;
            }
            let last = candles.last()?;
            Some(Signal {
                symbol: symbol.to_string(),
                interval,
                tier: None,
                price: last.close,
                time: last.timestamp,
                range_pct: dec!(1.5),
                volume_multiple: dec!(3),
                volume_kind: VolumeKind::Climax,
                risk: RiskPlan::from_atr(last.close, dec!(0.5)),
                strength: 80,
            })
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _message: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Transport {
                channel: "failing",
                message: "connection refused".to_string(),
            })
        }
    }

    fn tier(symbols: &[&str]) -> Tier {
        Tier::new(
            "fast_1m",
            Interval::OneMinute,
            Duration::from_secs(60),
            symbols.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn detector(hits: &[&str]) -> Arc<StubDetector> {
        Arc::new(StubDetector {
            hits: hits.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn prioritizer() -> SymbolPrioritizer {
        SymbolPrioritizer::with_rankings(vec![
            ("SPY".to_string(), 100),
            ("QQQ".to_string(), 95),
            ("AAPL".to_string(), 90),
        ])
    }

    #[tokio::test]
    async fn test_scan_alerts_on_signal_with_tier_name() {
        let source = Arc::new(StubSource::new(300));
        let notifier = Arc::new(LogNotifier::new());
        let scanner = TierScanner::new(
            source.clone(),
            detector(&["QQQ"]),
            notifier.clone(),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let report = scanner.scan_tier(&tier(&["AAPL", "QQQ", "SPY"])).await.unwrap();

        assert_eq!(source.calls(), vec!["SPY", "QQQ", "AAPL"]);
        assert_eq!(report.scanned, 3);
        assert_eq!(report.signals.len(), 1);
        assert_eq!(report.signals[0].tier.as_deref(), Some("fast_1m"));
        assert_eq!(report.alerts_sent, 1);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("*QQQ*"));
        assert!(sent[0].contains("Tier: fast_1m"));
    }

    #[tokio::test]
    async fn test_budget_limits_selection_to_top_ranked() {
        // 7 calls shared by 3 tiers: 2 symbols this cycle.
        let source = Arc::new(StubSource::new(7));
        let scanner = TierScanner::new(
            source.clone(),
            detector(&[]),
            Arc::new(LogNotifier::new()),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let report = scanner.scan_tier(&tier(&["AAPL", "QQQ", "SPY"])).await.unwrap();

        assert_eq!(report.selected, vec!["SPY", "QQQ"]);
        assert_eq!(source.calls(), vec!["SPY", "QQQ"]);
        assert_eq!(report.budget, 7);
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_cycle_without_fetching() {
        let source = Arc::new(StubSource::new(2));
        let scanner = TierScanner::new(
            source.clone(),
            detector(&["SPY"]),
            Arc::new(LogNotifier::new()),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let report = scanner.scan_tier(&tier(&["SPY", "QQQ"])).await.unwrap();

        assert!(report.budget_exhausted());
        assert!(source.calls().is_empty());
        assert!(report.signals.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_symbol_is_skipped_and_scan_continues() {
        let mut source = StubSource::new(300);
        source.missing.insert("QQQ".to_string());
        let source = Arc::new(source);
        let scanner = TierScanner::new(
            source.clone(),
            detector(&["AAPL"]),
            Arc::new(LogNotifier::new()),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let report = scanner.scan_tier(&tier(&["SPY", "QQQ", "AAPL"])).await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].symbol, "QQQ");
        assert_eq!(report.signals.len(), 1);
    }

    #[tokio::test]
    async fn test_notifier_failure_is_counted_not_fatal() {
        let scanner = TierScanner::new(
            Arc::new(StubSource::new(300)),
            detector(&["SPY", "AAPL"]),
            Arc::new(FailingNotifier),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let report = scanner.scan_tier(&tier(&["SPY", "AAPL"])).await.unwrap();

        assert_eq!(report.signals.len(), 2);
        assert_eq!(report.alerts_sent, 0);
        assert_eq!(report.alerts_failed, 2);
    }

    #[tokio::test]
    async fn test_no_providers_aborts_scan() {
        let mut source = StubSource::new(300);
        source.no_providers = true;
        let source = Arc::new(source);
        let scanner = TierScanner::new(
            source.clone(),
            detector(&[]),
            Arc::new(LogNotifier::new()),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let err = scanner.scan_tier(&tier(&["SPY", "QQQ"])).await.unwrap_err();

        assert!(matches!(err, ScanError::MarketData { .. }));
        assert_eq!(source.calls(), vec!["SPY"]);
    }

    #[tokio::test]
    async fn test_empty_tier_is_an_error() {
        let scanner = TierScanner::new(
            Arc::new(StubSource::new(300)),
            detector(&[]),
            Arc::new(LogNotifier::new()),
            prioritizer(),
            BudgetPolicy::default(),
        );

        let err = scanner.scan_tier(&tier(&[])).await.unwrap_err();
        assert!(matches!(err, ScanError::EmptyTier { .. }));
    }
}
