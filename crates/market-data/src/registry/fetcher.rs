//! Cascading fetcher: cache first, then providers in fallback order.
//!
//! For each request the fetcher:
//! 1. Serves a fresh cache entry without touching any provider
//! 2. Walks providers by priority rank
//! 3. Skips providers with an open or disabled circuit, or no support for
//!    the interval
//! 4. Waits for a rate-limit slot, or skips the provider when the policy
//!    doesn't wait (a spent daily budget always skips)
//! 5. Calls the provider, retrying transient failures per policy
//! 6. Validates and normalizes the candles
//! 7. Writes through to the cache, counts usage, returns
//!
//! When every provider fails the caller gets `DataUnavailable` with the
//! per-provider diagnostics. A local failure (`RetryClass::Never`) stops the
//! cascade and is returned as is.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use super::{
    CandleValidator, CircuitBreaker, CircuitBreakerConfig, CircuitMetrics, FetchDiagnostics,
    FetchPolicy, RateLimiter, SkipReason, UsageAccounting,
};
use crate::cache::{CacheKey, CacheStore};
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{normalize_series, Candle, Interval, ProviderId, ProviderQuota};
use crate::provider::MarketDataProvider;
use crate::usage::UsageTracker;

#[derive(Default)]
struct ProviderCounters {
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Counters since process start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub providers: Vec<ProviderStats>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    pub provider: String,
    pub successes: u64,
    pub failures: u64,
}

/// Outcome of one provider in the cascade.
enum Attempt {
    Served(Vec<Candle>),
    Next,
    Abort(MarketDataError),
}

struct RegisteredProvider {
    provider: Arc<dyn MarketDataProvider>,
    quota: ProviderQuota,
    counters: ProviderCounters,
}

impl RegisteredProvider {
    fn id(&self) -> ProviderId {
        Cow::Borrowed(self.provider.id())
    }
}

pub struct CascadingFetcher {
    providers: Vec<RegisteredProvider>,
    cache: Arc<CacheStore>,
    usage: Arc<UsageTracker>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
    validator: CandleValidator,
    policy: FetchPolicy,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl CascadingFetcher {
    /// Register providers in fallback order and their quotas with the usage
    /// tracker and rate limiter.
    pub fn new(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        cache: Arc<CacheStore>,
        usage: Arc<UsageTracker>,
        policy: FetchPolicy,
    ) -> Self {
        Self::with_circuit_breaker(
            providers,
            cache,
            usage,
            policy,
            CircuitBreakerConfig::default(),
        )
    }

    pub fn with_circuit_breaker(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        cache: Arc<CacheStore>,
        usage: Arc<UsageTracker>,
        policy: FetchPolicy,
        breaker: CircuitBreakerConfig,
    ) -> Self {
        let rate_limiter = RateLimiter::new(usage.clone());

        let mut registered: Vec<RegisteredProvider> = providers
            .into_iter()
            .map(|provider| {
                let quota = policy.quota_for(provider.id(), provider.quota());
                RegisteredProvider {
                    provider,
                    quota,
                    counters: ProviderCounters::default(),
                }
            })
            .collect();
        // Stable: equal ranks keep registration order.
        registered.sort_by_key(|p| p.quota.priority_rank);

        for p in &registered {
            let id = p.id();
            usage.set_limit(&id, p.quota.daily_limit);
            rate_limiter.configure(&id, p.quota.per_minute_limit);
            debug!(
                "Registered provider '{}' (rank {}, daily {:?}, per minute {:?})",
                id, p.quota.priority_rank, p.quota.daily_limit, p.quota.per_minute_limit
            );
        }

        Self {
            providers: registered,
            cache,
            usage,
            rate_limiter,
            circuit_breaker: CircuitBreaker::with_config(breaker),
            validator: CandleValidator::new(),
            policy,
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    /// Candles for `symbol` at `interval`, from cache or the first provider
    /// that delivers.
    pub async fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let key = CacheKey::new(symbol, interval);
        if let Some(candles) = self.cache.get(&key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", key);
            return Ok(candles);
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        if self.providers.is_empty() {
            return Err(MarketDataError::NoProvidersAvailable);
        }

        let mut diagnostics = FetchDiagnostics::new();

        for registered in &self.providers {
            match self
                .try_provider(registered, symbol, interval, &mut diagnostics)
                .await
            {
                Attempt::Served(candles) => {
                    debug!("Fetch {}: {}", key, diagnostics.summary());
                    self.cache
                        .put(key, candles.clone(), self.policy.ttl_for(interval));
                    return Ok(candles);
                }
                Attempt::Next => {}
                Attempt::Abort(err) => {
                    warn!("Fetch {} aborted: {}", key, diagnostics.summary());
                    return Err(err);
                }
            }
        }

        warn!("No data for {}: {}", key, diagnostics.summary());
        Err(MarketDataError::DataUnavailable {
            symbol: symbol.to_string(),
            interval,
            attempts: diagnostics.attempts,
        })
    }

    /// Run one provider to completion and record the outcome in
    /// `diagnostics`.
    async fn try_provider(
        &self,
        registered: &RegisteredProvider,
        symbol: &str,
        interval: Interval,
        diagnostics: &mut FetchDiagnostics,
    ) -> Attempt {
        let id = registered.id();
        let provider = &registered.provider;

        match self.circuit_breaker.admit(&id) {
            super::Admission::Allowed => {}
            super::Admission::Open => {
                debug!("Circuit open for '{}', skipping", id);
                diagnostics.record_skip(id, SkipReason::CircuitBreakerOpen);
                return Attempt::Next;
            }
            super::Admission::Disabled => {
                diagnostics.record_skip(id, SkipReason::Disabled);
                return Attempt::Next;
            }
        }

        if !provider.capabilities().supports(interval) {
            diagnostics.record_skip(id, SkipReason::IntervalNotSupported);
            return Attempt::Next;
        }

        let mut retries_left = self.policy.transient_retries;
        loop {
            let slot = if self.policy.wait_for_slot {
                self.rate_limiter.acquire(&id).await
            } else {
                self.rate_limiter.try_acquire(&id)
            };
            if let Err(err) = slot {
                debug!("{}", err);
                let reason = match err {
                    MarketDataError::RateLimitExceeded { .. } => SkipReason::RateLimited,
                    _ => SkipReason::BudgetExhausted,
                };
                diagnostics.record_skip(id, reason);
                return Attempt::Next;
            }

            if self.policy.accounting == UsageAccounting::EveryAttempt {
                self.usage.increment(&id);
            }

            let result = provider
                .fetch_candles(symbol, interval)
                .await
                .and_then(|candles| {
                    let series = normalize_series(candles, self.policy.max_candles);
                    self.validator.validate_series(&id, symbol, series)
                });

            match result {
                Ok(candles) => {
                    if self.policy.accounting == UsageAccounting::SuccessOnly {
                        self.usage.increment(&id);
                    }
                    self.circuit_breaker.record_success(&id);
                    registered.counters.successes.fetch_add(1, Ordering::Relaxed);
                    info!(
                        "Fetched {} {} candles for {} from '{}'",
                        candles.len(),
                        interval,
                        symbol,
                        id
                    );
                    diagnostics.record_success(id);
                    return Attempt::Served(candles);
                }
                Err(err) => {
                    registered.counters.failures.fetch_add(1, Ordering::Relaxed);
                    match err.retry_class() {
                        RetryClass::RetryThenFailover if retries_left > 0 => {
                            retries_left -= 1;
                            warn!(
                                "Provider '{}' failed for {}: {}, retrying",
                                id, symbol, err
                            );
                            tokio::time::sleep(self.policy.retry_delay).await;
                            continue;
                        }
                        RetryClass::RetryThenFailover | RetryClass::FailoverWithPenalty => {
                            self.circuit_breaker.record_failure(&id);
                            warn!("Provider '{}' failed for {}: {}", id, symbol, err);
                        }
                        RetryClass::DisableProvider => {
                            self.circuit_breaker.disable(&id);
                            warn!(
                                "Provider '{}' rejected credentials, disabled: {}",
                                id, err
                            );
                        }
                        RetryClass::NextProvider => {
                            info!(
                                "Provider '{}' could not serve {}: {}, trying next",
                                id, symbol, err
                            );
                        }
                        RetryClass::Never => {
                            diagnostics.record_error(id, err.to_string());
                            return Attempt::Abort(err);
                        }
                    }
                    diagnostics.record_error(id, err.to_string());
                    return Attempt::Next;
                }
            }
        }
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            providers: self
                .providers
                .iter()
                .map(|p| ProviderStats {
                    provider: p.provider.id().to_string(),
                    successes: p.counters.successes.load(Ordering::Relaxed),
                    failures: p.counters.failures.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }

    /// Provider ids in fallback order.
    pub fn provider_order(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.provider.id()).collect()
    }

    pub fn circuit_metrics(&self) -> Vec<CircuitMetrics> {
        self.circuit_breaker.metrics()
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    /// Per-provider quota after configuration overrides.
    pub fn quotas(&self) -> HashMap<&'static str, ProviderQuota> {
        self.providers
            .iter()
            .map(|p| (p.provider.id(), p.quota))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::persistence::MemoryBackend;
    use crate::provider::ProviderCapabilities;
    use crate::usage::UsageRecovery;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    type Scripted = Result<Vec<Candle>, MarketDataError>;

    struct MockProvider {
        id: &'static str,
        quota: ProviderQuota,
        intervals: &'static [Interval],
        script: Mutex<VecDeque<Scripted>>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, rank: u8) -> Self {
            Self {
                id,
                quota: ProviderQuota::metered(100, 100, rank),
                intervals: &Interval::ALL,
                script: Mutex::new(VecDeque::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        fn then(self, outcome: Scripted) -> Self {
            self.script.lock().unwrap().push_back(outcome);
            self
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn quota(&self) -> ProviderQuota {
            self.quota
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                intervals: self.intervals,
            }
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            _interval: Interval,
        ) -> Result<Vec<Candle>, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(bars(3)))
        }
    }

    fn bars(n: u32) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                Candle::new(
                    Utc.with_ymd_and_hms(2024, 3, 4, 15, i, 0).unwrap(),
                    dec!(10),
                    dec!(11),
                    dec!(9),
                    dec!(10.5),
                    dec!(1000),
                )
            })
            .collect()
    }

    fn usage() -> Arc<UsageTracker> {
        Arc::new(UsageTracker::open(
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
            chrono_tz::UTC,
            UsageRecovery::FailOpen,
        ))
    }

    fn fetcher(providers: Vec<Arc<MockProvider>>, policy: FetchPolicy) -> CascadingFetcher {
        let providers: Vec<Arc<dyn MarketDataProvider>> = providers
            .into_iter()
            .map(|p| p as Arc<dyn MarketDataProvider>)
            .collect();
        CascadingFetcher::new(
            providers,
            Arc::new(CacheStore::in_memory(Arc::new(SystemClock))),
            usage(),
            FetchPolicy {
                retry_delay: Duration::ZERO,
                ..policy
            },
        )
    }

    fn transient(id: &str) -> Scripted {
        Err(MarketDataError::Transient {
            provider: id.to_string(),
            message: "HTTP 502".to_string(),
        })
    }

    #[tokio::test]
    async fn test_providers_sorted_by_rank() {
        let a = Arc::new(MockProvider::new("YAHOO", 4));
        let b = Arc::new(MockProvider::new("FMP", 1));
        let c = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![a, b, c], FetchPolicy::default());
        assert_eq!(fetcher.provider_order(), vec!["FMP", "TWELVE_DATA", "YAHOO"]);
    }

    #[tokio::test]
    async fn test_transient_error_retried_once_then_falls_through() {
        let primary = Arc::new(
            MockProvider::new("FMP", 1)
                .then(transient("FMP"))
                .then(transient("FMP")),
        );
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![primary.clone(), secondary.clone()], FetchPolicy::default());

        let candles = fetcher.fetch("AAPL", Interval::FiveMinutes).await.unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(primary.calls(), 2);
        assert_eq!(secondary.calls(), 1);

        let stats = fetcher.stats();
        assert_eq!(stats.providers[0].failures, 2);
        assert_eq!(stats.providers[1].successes, 1);
    }

    #[tokio::test]
    async fn test_transient_retry_can_recover() {
        let primary = Arc::new(MockProvider::new("FMP", 1).then(transient("FMP")));
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![primary.clone(), secondary.clone()], FetchPolicy::default());

        fetcher.fetch("AAPL", Interval::FiveMinutes).await.unwrap();
        assert_eq!(primary.calls(), 2);
        assert_eq!(secondary.calls(), 0);
        assert_eq!(fetcher.usage().record(&Cow::Borrowed("FMP")).count, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_disables_provider_for_later_fetches() {
        let primary = Arc::new(MockProvider::new("FMP", 1).then(Err(
            MarketDataError::Unauthorized {
                provider: "FMP".to_string(),
            },
        )));
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![primary.clone(), secondary.clone()], FetchPolicy::default());

        fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap();
        fetcher.fetch("MSFT", Interval::OneMinute).await.unwrap();

        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 2);

        let metrics = fetcher.circuit_metrics();
        let fmp = metrics.iter().find(|m| m.provider == "FMP").unwrap();
        assert_eq!(fmp.state, crate::registry::CircuitState::Disabled);
    }

    #[tokio::test]
    async fn test_unsupported_interval_is_skipped_without_call() {
        let mut primary = MockProvider::new("FMP", 1);
        primary.intervals = &[Interval::OneMinute];
        let primary = Arc::new(primary);
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![primary.clone(), secondary.clone()], FetchPolicy::default());

        fetcher.fetch("AAPL", Interval::OneHour).await.unwrap();
        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_candles_count_as_provider_failure() {
        let broken = vec![Candle::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
            dec!(10),
            dec!(9),
            dec!(11),
            dec!(10),
            dec!(100),
        )];
        let primary = Arc::new(MockProvider::new("FMP", 1).then(Ok(broken)));
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![primary.clone(), secondary.clone()], FetchPolicy::default());

        fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap();
        assert_eq!(primary.calls(), 1);
        assert_eq!(fetcher.usage().record(&Cow::Borrowed("FMP")).count, 0);
        assert_eq!(fetcher.usage().record(&Cow::Borrowed("TWELVE_DATA")).count, 1);
    }

    #[tokio::test]
    async fn test_every_attempt_accounting_counts_failures() {
        let primary = Arc::new(
            MockProvider::new("FMP", 1)
                .then(transient("FMP"))
                .then(transient("FMP")),
        );
        let fetcher = fetcher(
            vec![primary],
            FetchPolicy {
                accounting: UsageAccounting::EveryAttempt,
                ..FetchPolicy::default()
            },
        );

        let err = fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap_err();
        match err {
            MarketDataError::DataUnavailable { attempts, .. } => {
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].error.as_deref().unwrap_or("").contains("HTTP 502"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fetcher.usage().record(&Cow::Borrowed("FMP")).count, 2);
    }

    #[tokio::test]
    async fn test_local_failure_stops_cascade() {
        let primary = Arc::new(MockProvider::new("FMP", 1).then(Err(
            MarketDataError::CacheCorruption("unexpected end of file".to_string()),
        )));
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(vec![primary.clone(), secondary.clone()], FetchPolicy::default());

        let err = fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap_err();

        assert!(matches!(err, MarketDataError::CacheCorruption(_)));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
        assert_eq!(fetcher.cache().len(), 0);
    }

    #[tokio::test]
    async fn test_full_window_skips_provider_when_not_waiting() {
        let mut primary = MockProvider::new("FMP", 1);
        primary.quota = ProviderQuota::metered(100, 1, 1);
        let primary = Arc::new(primary);
        let secondary = Arc::new(MockProvider::new("TWELVE_DATA", 2));
        let fetcher = fetcher(
            vec![primary.clone(), secondary.clone()],
            FetchPolicy {
                wait_for_slot: false,
                ..FetchPolicy::default()
            },
        );

        fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap();
        fetcher.fetch("MSFT", Interval::OneMinute).await.unwrap();

        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_full_window_reported_as_rate_limited_skip() {
        let mut only = MockProvider::new("FMP", 1);
        only.quota = ProviderQuota::metered(100, 1, 1);
        let fetcher = fetcher(
            vec![Arc::new(only)],
            FetchPolicy {
                wait_for_slot: false,
                ..FetchPolicy::default()
            },
        );

        fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap();
        let err = fetcher.fetch("MSFT", Interval::OneMinute).await.unwrap_err();

        match err {
            MarketDataError::DataUnavailable { attempts, .. } => {
                assert_eq!(attempts.len(), 1);
                assert_eq!(attempts[0].skipped, Some(SkipReason::RateLimited));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_quotas_reflect_overrides() {
        let primary = Arc::new(MockProvider::new("FMP", 1));
        let mut policy = FetchPolicy::default();
        policy
            .quota_overrides
            .insert("FMP".to_string(), ProviderQuota::metered(500, 20, 1));
        let fetcher = fetcher(vec![primary], policy);

        assert_eq!(
            fetcher.quotas().get("FMP"),
            Some(&ProviderQuota::metered(500, 20, 1))
        );
        assert_eq!(fetcher.usage().remaining(&Cow::Borrowed("FMP")), 500);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let fetcher = fetcher(Vec::new(), FetchPolicy::default());
        let err = fetcher.fetch("AAPL", Interval::OneMinute).await.unwrap_err();
        assert!(matches!(err, MarketDataError::NoProvidersAvailable));
    }
}
