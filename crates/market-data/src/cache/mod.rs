//! Disk-backed candle cache with per-entry expiry.
//!
//! Entries are keyed by (symbol, interval) and hold the full normalized
//! series together with an absolute expiry time. An entry is served only
//! while `now < expires_at`; expired entries read as absent and are removed
//! by [`CacheStore::purge_expired`]. Every write rewrites the persisted
//! snapshot. The cache is best-effort: persistence failures are logged and
//! the in-memory state stays authoritative.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::errors::MarketDataError;
use crate::models::{Candle, Interval};
use crate::persistence::{MemoryBackend, SnapshotBackend};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub interval: Interval,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
        }
    }

    /// Key used in the persisted file, e.g. `AAPL_5min`.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.symbol, self.interval)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.interval)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub candles: Vec<Candle>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    symbol: String,
    interval: Interval,
    candles: Vec<Candle>,
    expires_at: DateTime<Utc>,
}

pub struct CacheStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    backend: Arc<dyn SnapshotBackend>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Load the persisted cache.
    ///
    /// A malformed snapshot is logged as a warning and the cache starts
    /// empty. Entries that expired while the process was down are dropped.
    pub fn open(backend: Arc<dyn SnapshotBackend>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let entries = match Self::load(backend.as_ref()) {
            Ok(persisted) => {
                let total = persisted.len();
                let entries: HashMap<CacheKey, CacheEntry> = persisted
                    .into_values()
                    .filter(|e| now < e.expires_at)
                    .map(|e| {
                        let key = CacheKey::new(e.symbol, e.interval);
                        let entry = CacheEntry {
                            key: key.clone(),
                            candles: e.candles,
                            expires_at: e.expires_at,
                        };
                        (key, entry)
                    })
                    .collect();
                if total > 0 {
                    info!(
                        "Cache: loaded {} entries from {} ({} expired)",
                        entries.len(),
                        backend.describe(),
                        total - entries.len()
                    );
                }
                entries
            }
            Err(err) => {
                warn!("{} ({}), starting empty", err, backend.describe());
                HashMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            backend,
            clock,
        }
    }

    /// A cache that never touches the disk.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::open(Arc::new(MemoryBackend::new()), clock)
    }

    fn load(
        backend: &dyn SnapshotBackend,
    ) -> Result<BTreeMap<String, PersistedEntry>, MarketDataError> {
        let bytes = backend
            .load()
            .map_err(|e| MarketDataError::CacheCorruption(e.to_string()))?;
        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| MarketDataError::CacheCorruption(e.to_string())),
            None => Ok(BTreeMap::new()),
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn persist(&self, entries: &HashMap<CacheKey, CacheEntry>) {
        let snapshot: BTreeMap<String, PersistedEntry> = entries
            .values()
            .map(|e| {
                (
                    e.key.storage_key(),
                    PersistedEntry {
                        symbol: e.key.symbol.clone(),
                        interval: e.key.interval,
                        candles: e.candles.clone(),
                        expires_at: e.expires_at,
                    },
                )
            })
            .collect();

        let result = serde_json::to_vec(&snapshot)
            .map_err(MarketDataError::from)
            .and_then(|bytes| self.backend.store(&bytes).map_err(MarketDataError::from));
        if let Err(err) = result {
            warn!(
                "Cache: failed to persist to {}: {}",
                self.backend.describe(),
                err
            );
        }
    }

    /// Candles for `key` if present and not yet expired.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<Candle>> {
        let now = self.clock.now();
        self.lock_entries()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.candles.clone())
    }

    /// Expiry time of the entry for `key`, fresh or not.
    pub fn expires_at(&self, key: &CacheKey) -> Option<DateTime<Utc>> {
        self.lock_entries().get(key).map(|e| e.expires_at)
    }

    /// Store a series, replacing any previous entry, and persist.
    ///
    /// A zero `ttl` stores nothing.
    pub fn put(&self, key: CacheKey, candles: Vec<Candle>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        debug!(
            "Cache: storing {} ({} candles) until {}",
            key,
            candles.len(),
            expires_at
        );

        let mut entries = self.lock_entries();
        entries.insert(
            key.clone(),
            CacheEntry {
                key,
                candles,
                expires_at,
            },
        );
        self.persist(&entries);
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Cache: purged {} expired entries", removed);
            self.persist(&entries);
        }
        removed
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::JsonFileBackend;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
        ))
    }

    fn series(n: u32) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                Candle::new(
                    Utc.with_ymd_and_hms(2024, 3, 4, 14, i, 0).unwrap(),
                    dec!(10.10),
                    dec!(10.55),
                    dec!(9.95),
                    dec!(10.2) + rust_decimal::Decimal::from(i),
                    dec!(12345),
                )
            })
            .collect()
    }

    #[test]
    fn test_get_returns_payload_until_expiry() {
        let clock = clock();
        let cache = CacheStore::in_memory(clock.clone());
        let key = CacheKey::new("AAA", Interval::OneMinute);

        cache.put(key.clone(), series(5), Duration::from_secs(60));
        assert_eq!(cache.get(&key), Some(series(5)));

        clock.advance(chrono::Duration::seconds(59));
        assert_eq!(cache.get(&key), Some(series(5)));

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_previous_entry() {
        let clock = clock();
        let cache = CacheStore::in_memory(clock.clone());
        let key = CacheKey::new("AAA", Interval::FiveMinutes);

        cache.put(key.clone(), series(3), Duration::from_secs(60));
        clock.advance(chrono::Duration::seconds(50));
        cache.put(key.clone(), series(4), Duration::from_secs(60));

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.get(&key).map(|c| c.len()), Some(4));
    }

    #[test]
    fn test_zero_ttl_is_not_stored() {
        let cache = CacheStore::in_memory(clock());
        let key = CacheKey::new("AAA", Interval::OneMinute);
        cache.put(key.clone(), series(2), Duration::ZERO);
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_removes_only_expired() {
        let clock = clock();
        let cache = CacheStore::in_memory(clock.clone());
        let short = CacheKey::new("AAA", Interval::OneMinute);
        let long = CacheKey::new("AAA", Interval::FifteenMinutes);

        cache.put(short.clone(), series(2), Duration::from_secs(60));
        cache.put(long.clone(), series(2), Duration::from_secs(600));

        clock.advance(chrono::Duration::seconds(120));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&long).is_some());
        assert!(cache.expires_at(&short).is_none());
    }

    #[test]
    fn test_cache_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_cache.json");
        let clock = clock();
        let key = CacheKey::new("MSFT", Interval::FiveMinutes);

        {
            let cache = CacheStore::open(Arc::new(JsonFileBackend::new(&path)), clock.clone());
            cache.put(key.clone(), series(5), Duration::from_secs(180));
            cache.put(
                CacheKey::new("AAPL", Interval::OneMinute),
                series(1),
                Duration::from_secs(60),
            );
        }

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["MSFT_5min"]["symbol"], "MSFT");
        assert_eq!(raw["MSFT_5min"]["interval"], "5min");

        clock.advance(chrono::Duration::seconds(90));
        let cache = CacheStore::open(Arc::new(JsonFileBackend::new(&path)), clock);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key), Some(series(5)));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let backend = Arc::new(MemoryBackend::with_contents("{\"AAA_1min\": [truncated"));
        let cache = CacheStore::open(backend.clone(), clock());
        assert!(cache.is_empty());

        let key = CacheKey::new("AAA", Interval::OneMinute);
        cache.put(key.clone(), series(1), Duration::from_secs(60));
        let raw: serde_json::Value = serde_json::from_slice(&backend.contents().unwrap()).unwrap();
        assert!(raw.get("AAA_1min").is_some());
    }
}
