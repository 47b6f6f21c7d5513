//! Daily API usage accounting.
//!
//! Counts calls per provider against its daily quota. Counters roll over
//! lazily: the first read or write on a new calendar day (in the configured
//! reset time zone) zeroes every counter before doing anything else. The
//! whole map is persisted after every change.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::errors::MarketDataError;
use crate::models::ProviderId;
use crate::persistence::SnapshotBackend;

/// What to assume about today's usage when the persisted file is unreadable.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageRecovery {
    /// Start today at zero.
    #[default]
    FailOpen,
    /// Treat every metered provider as exhausted until the next day.
    FailClosed,
}

/// Usage of one provider for one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub provider: String,
    pub date: NaiveDate,
    pub count: u32,
    /// `None` for unmetered providers.
    pub limit: Option<u32>,
}

impl UsageRecord {
    pub fn remaining(&self) -> u32 {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.count),
            None => u32::MAX,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.count >= limit)
    }

    /// Share of the daily quota used, in percent. Zero for unmetered providers.
    pub fn usage_pct(&self) -> f64 {
        match self.limit {
            Some(0) => 100.0,
            Some(limit) => f64::from(self.count) / f64::from(limit) * 100.0,
            None => 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DayCount {
    date: NaiveDate,
    count: u32,
}

#[derive(Debug, Default)]
struct UsageState {
    counts: BTreeMap<String, DayCount>,
    limits: HashMap<String, u32>,
    /// Day on which the persisted file could not be trusted under `FailClosed`.
    fail_closed_on: Option<NaiveDate>,
}

impl UsageState {
    /// Zero every counter that belongs to an earlier day. Returns whether
    /// anything changed.
    fn roll_over(&mut self, today: NaiveDate) -> bool {
        let mut changed = false;
        for (provider, day) in self.counts.iter_mut() {
            if day.date != today {
                debug!(
                    "Usage: rolling over '{}' from {} ({} calls) to {}",
                    provider, day.date, day.count, today
                );
                day.date = today;
                day.count = 0;
                changed = true;
            }
        }
        if self.fail_closed_on.is_some_and(|d| d != today) {
            self.fail_closed_on = None;
        }
        changed
    }

    fn count(&self, provider: &str, today: NaiveDate) -> u32 {
        match self.counts.get(provider) {
            Some(day) if day.date == today => day.count,
            _ => 0,
        }
    }
}

/// Persistent per-provider daily call counter.
pub struct UsageTracker {
    state: Mutex<UsageState>,
    backend: Arc<dyn SnapshotBackend>,
    clock: Arc<dyn Clock>,
    reset_tz: Tz,
}

impl UsageTracker {
    /// Load persisted usage and start tracking.
    ///
    /// An unreadable or malformed file is logged as a warning and handled
    /// according to `recovery`; it never fails startup.
    pub fn open(
        backend: Arc<dyn SnapshotBackend>,
        clock: Arc<dyn Clock>,
        reset_tz: Tz,
        recovery: UsageRecovery,
    ) -> Self {
        let tracker = Self {
            state: Mutex::new(UsageState::default()),
            backend,
            clock,
            reset_tz,
        };

        let today = tracker.today();
        let mut state = UsageState::default();
        match tracker.load() {
            Ok(counts) => {
                state.counts = counts;
                if state.roll_over(today) {
                    info!("Usage: new day {}, counters reset", today);
                }
            }
            Err(err) => {
                warn!("{} ({})", err, tracker.backend.describe());
                if recovery == UsageRecovery::FailClosed {
                    warn!("Usage: treating metered providers as exhausted for {}", today);
                    state.fail_closed_on = Some(today);
                }
            }
        }
        *tracker.lock_state() = state;
        tracker
    }

    fn load(&self) -> Result<BTreeMap<String, DayCount>, MarketDataError> {
        let bytes = self
            .backend
            .load()
            .map_err(|e| MarketDataError::UsageFileCorruption(e.to_string()))?;
        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| MarketDataError::UsageFileCorruption(e.to_string())),
            None => Ok(BTreeMap::new()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, UsageState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Usage tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.reset_tz).date_naive()
    }

    fn persist(&self, state: &UsageState) {
        let result = serde_json::to_vec_pretty(&state.counts)
            .map_err(MarketDataError::from)
            .and_then(|bytes| self.backend.store(&bytes).map_err(MarketDataError::from));
        if let Err(err) = result {
            warn!(
                "Usage: failed to persist to {}: {}",
                self.backend.describe(),
                err
            );
        }
    }

    /// Lock the state with today's rollover already applied.
    fn current(&self) -> (MutexGuard<'_, UsageState>, NaiveDate) {
        let today = self.today();
        let mut state = self.lock_state();
        if state.roll_over(today) {
            info!("Usage: new day {}, counters reset", today);
            self.persist(&state);
        }
        (state, today)
    }

    /// Register a provider's daily quota. `None` marks it unmetered.
    pub fn set_limit(&self, provider: &ProviderId, limit: Option<u32>) {
        let (mut state, today) = self.current();
        match limit {
            Some(limit) => {
                state.limits.insert(provider.to_string(), limit);
                if state.fail_closed_on == Some(today) {
                    state
                        .counts
                        .insert(provider.to_string(), DayCount { date: today, count: limit });
                    self.persist(&state);
                }
            }
            None => {
                state.limits.remove(provider.as_ref());
            }
        }
    }

    /// Count one call and persist. Returns today's count after the increment.
    pub fn increment(&self, provider: &ProviderId) -> u32 {
        let (mut state, today) = self.current();
        let entry = state
            .counts
            .entry(provider.to_string())
            .or_insert(DayCount { date: today, count: 0 });
        entry.count = entry.count.saturating_add(1);
        let count = entry.count;

        if let Some(limit) = state.limits.get(provider.as_ref()) {
            debug!("Usage: {} {}/{} for {}", provider, count, limit, today);
        }
        self.persist(&state);
        count
    }

    /// Calls left today. `u32::MAX` for unmetered or unknown providers.
    pub fn remaining(&self, provider: &ProviderId) -> u32 {
        self.record(provider).remaining()
    }

    pub fn is_exhausted(&self, provider: &ProviderId) -> bool {
        self.record(provider).is_exhausted()
    }

    pub fn record(&self, provider: &ProviderId) -> UsageRecord {
        let (state, today) = self.current();
        UsageRecord {
            provider: provider.to_string(),
            date: today,
            count: state.count(provider, today),
            limit: state.limits.get(provider.as_ref()).copied(),
        }
    }

    /// Providers with a daily quota, sorted by id.
    pub fn metered_providers(&self) -> Vec<String> {
        let state = self.lock_state();
        let mut providers: Vec<String> = state.limits.keys().cloned().collect();
        providers.sort();
        providers
    }

    /// Usage of every known provider, sorted by id.
    pub fn snapshot(&self) -> Vec<UsageRecord> {
        let (state, today) = self.current();
        let mut names: Vec<&String> = state.limits.keys().chain(state.counts.keys()).collect();
        names.sort();
        names.dedup();
        names
            .into_iter()
            .map(|name| UsageRecord {
                provider: name.clone(),
                date: today,
                count: state.count(name, today),
                limit: state.limits.get(name).copied(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::{JsonFileBackend, MemoryBackend};
    use chrono::{Duration, TimeZone, Utc};
    use std::borrow::Cow;

    const FMP: ProviderId = Cow::Borrowed("FMP");
    const YAHOO: ProviderId = Cow::Borrowed("YAHOO");

    fn clock_at(h: u32, m: u32) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap(),
        ))
    }

    fn tracker_with(
        backend: Arc<dyn SnapshotBackend>,
        clock: Arc<ManualClock>,
        recovery: UsageRecovery,
    ) -> UsageTracker {
        UsageTracker::open(backend, clock, chrono_tz::UTC, recovery)
    }

    #[test]
    fn test_increment_counts_down_remaining() {
        let tracker = tracker_with(
            Arc::new(MemoryBackend::new()),
            clock_at(10, 0),
            UsageRecovery::FailOpen,
        );
        tracker.set_limit(&FMP, Some(3));

        assert_eq!(tracker.remaining(&FMP), 3);
        assert_eq!(tracker.increment(&FMP), 1);
        assert_eq!(tracker.increment(&FMP), 2);
        assert_eq!(tracker.remaining(&FMP), 1);
        assert!(!tracker.is_exhausted(&FMP));

        tracker.increment(&FMP);
        assert!(tracker.is_exhausted(&FMP));
        assert_eq!(tracker.remaining(&FMP), 0);
    }

    #[test]
    fn test_unmetered_provider_is_never_exhausted() {
        let tracker = tracker_with(
            Arc::new(MemoryBackend::new()),
            clock_at(10, 0),
            UsageRecovery::FailOpen,
        );
        tracker.set_limit(&YAHOO, None);
        for _ in 0..500 {
            tracker.increment(&YAHOO);
        }
        assert!(!tracker.is_exhausted(&YAHOO));
        assert_eq!(tracker.remaining(&YAHOO), u32::MAX);
        assert_eq!(tracker.record(&YAHOO).count, 500);
    }

    #[test]
    fn test_counts_reset_once_per_day_boundary() {
        let clock = clock_at(23, 59);
        let backend = Arc::new(MemoryBackend::new());
        let tracker = tracker_with(backend.clone(), clock.clone(), UsageRecovery::FailOpen);
        tracker.set_limit(&FMP, Some(10));

        for _ in 0..4 {
            tracker.increment(&FMP);
        }
        assert_eq!(tracker.remaining(&FMP), 6);

        clock.advance(Duration::minutes(2));
        assert_eq!(tracker.remaining(&FMP), 10);

        tracker.increment(&FMP);
        clock.advance(Duration::hours(3));
        assert_eq!(tracker.record(&FMP).count, 1);

        let persisted: BTreeMap<String, DayCount> =
            serde_json::from_slice(&backend.contents().unwrap()).unwrap();
        assert_eq!(persisted["FMP"].count, 1);
        assert_eq!(
            persisted["FMP"].date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_reset_follows_configured_time_zone() {
        // 03:30 UTC on March 5th is still March 4th in New York.
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 5, 3, 30, 0).unwrap(),
        ));
        let backend = Arc::new(MemoryBackend::with_contents(
            r#"{"FMP":{"date":"2024-03-04","count":7}}"#,
        ));
        let tracker = UsageTracker::open(
            backend,
            clock.clone(),
            chrono_tz::America::New_York,
            UsageRecovery::FailOpen,
        );
        tracker.set_limit(&FMP, Some(10));
        assert_eq!(tracker.remaining(&FMP), 3);

        clock.advance(Duration::hours(2));
        assert_eq!(tracker.remaining(&FMP), 10);
    }

    #[test]
    fn test_usage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_usage.json");
        let clock = clock_at(12, 0);

        {
            let tracker = tracker_with(
                Arc::new(JsonFileBackend::new(&path)),
                clock.clone(),
                UsageRecovery::FailOpen,
            );
            tracker.set_limit(&FMP, Some(250));
            tracker.increment(&FMP);
            tracker.increment(&FMP);
        }

        let tracker = tracker_with(
            Arc::new(JsonFileBackend::new(&path)),
            clock,
            UsageRecovery::FailOpen,
        );
        tracker.set_limit(&FMP, Some(250));
        assert_eq!(tracker.remaining(&FMP), 248);
    }

    #[test]
    fn test_stale_file_rolls_over_on_load() {
        let backend = Arc::new(MemoryBackend::with_contents(
            r#"{"FMP":{"date":"2024-03-01","count":250}}"#,
        ));
        let tracker = tracker_with(backend, clock_at(9, 0), UsageRecovery::FailOpen);
        tracker.set_limit(&FMP, Some(250));
        assert_eq!(tracker.remaining(&FMP), 250);
    }

    #[test]
    fn test_corrupt_file_fails_open_by_default() {
        let backend = Arc::new(MemoryBackend::with_contents("{not json"));
        let tracker = tracker_with(backend.clone(), clock_at(9, 0), UsageRecovery::default());
        tracker.set_limit(&FMP, Some(250));

        assert_eq!(tracker.remaining(&FMP), 250);
        tracker.increment(&FMP);

        let persisted: BTreeMap<String, DayCount> =
            serde_json::from_slice(&backend.contents().unwrap()).unwrap();
        assert_eq!(persisted["FMP"].count, 1);
    }

    #[test]
    fn test_corrupt_file_fails_closed_until_next_day() {
        let clock = clock_at(9, 0);
        let backend = Arc::new(MemoryBackend::with_contents("[1, 2"));
        let tracker = tracker_with(backend, clock.clone(), UsageRecovery::FailClosed);
        tracker.set_limit(&FMP, Some(250));
        tracker.set_limit(&YAHOO, None);

        assert!(tracker.is_exhausted(&FMP));
        assert!(!tracker.is_exhausted(&YAHOO));

        clock.advance(Duration::days(1));
        assert_eq!(tracker.remaining(&FMP), 250);
    }

    #[test]
    fn test_snapshot_lists_known_providers() {
        let tracker = tracker_with(
            Arc::new(MemoryBackend::new()),
            clock_at(10, 0),
            UsageRecovery::FailOpen,
        );
        tracker.set_limit(&FMP, Some(4));
        tracker.increment(&FMP);
        tracker.increment(&YAHOO);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].provider, "FMP");
        assert_eq!(snapshot[0].remaining(), 3);
        assert!((snapshot[0].usage_pct() - 25.0).abs() < f64::EPSILON);
        assert_eq!(snapshot[1].provider, "YAHOO");
        assert_eq!(snapshot[1].limit, None);
        assert_eq!(tracker.metered_providers(), vec!["FMP".to_string()]);
    }
}
