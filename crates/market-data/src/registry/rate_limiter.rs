//! Sliding-window rate limiter for market data providers.
//!
//! Each metered provider gets a window of call timestamps covering the last
//! 60 seconds. A call may proceed while the window holds fewer entries than
//! the provider's per-minute limit; otherwise `acquire` sleeps until the
//! oldest entry leaves the window. A spent daily budget is never waited
//! out: it fails immediately with `BudgetExhausted`.
//!
//! Time is measured with `tokio::time::Instant` so waits can be exercised
//! with paused time in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use crate::errors::MarketDataError;
use crate::models::ProviderId;
use crate::usage::UsageTracker;

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct SlidingWindow {
    limit: usize,
    calls: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new(limit: u32) -> Self {
        Self {
            limit: limit as usize,
            calls: VecDeque::with_capacity(limit as usize),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.calls.front() {
            if now.duration_since(*oldest) >= WINDOW {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a call at `now`, or return how long until one would fit.
    fn try_record(&mut self, now: Instant) -> Result<(), Duration> {
        self.prune(now);
        if self.calls.len() < self.limit {
            self.calls.push_back(now);
            return Ok(());
        }
        let wait = self
            .calls
            .front()
            .map(|oldest| WINDOW.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO);
        Err(wait)
    }
}

/// Per-provider call pacing backed by the daily usage tracker.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, SlidingWindow>>,
    usage: Arc<UsageTracker>,
}

impl RateLimiter {
    pub fn new(usage: Arc<UsageTracker>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            usage,
        }
    }

    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, SlidingWindow>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set a provider's per-minute ceiling. `None` or zero removes pacing.
    pub fn configure(&self, provider: &ProviderId, per_minute: Option<u32>) {
        let mut windows = self.lock_windows();
        match per_minute.filter(|limit| *limit > 0) {
            Some(limit) => {
                windows.insert(provider.to_string(), SlidingWindow::new(limit));
            }
            None => {
                windows.remove(provider.as_ref());
            }
        }
    }

    fn check_budget(&self, provider: &ProviderId) -> Result<(), MarketDataError> {
        if self.usage.is_exhausted(provider) {
            debug!("Rate limiter: daily budget exhausted for '{}'", provider);
            return Err(MarketDataError::BudgetExhausted {
                provider: provider.to_string(),
            });
        }
        Ok(())
    }

    fn try_record(&self, provider: &ProviderId) -> Result<(), Duration> {
        let mut windows = self.lock_windows();
        match windows.get_mut(provider.as_ref()) {
            Some(window) => window.try_record(Instant::now()),
            None => Ok(()),
        }
    }

    /// Wait until a call to `provider` may proceed.
    ///
    /// Fails without waiting when the provider's daily budget is spent.
    pub async fn acquire(&self, provider: &ProviderId) -> Result<(), MarketDataError> {
        loop {
            self.check_budget(provider)?;

            match self.try_record(provider) {
                Ok(()) => return Ok(()),
                Err(wait) => {
                    debug!(
                        "Rate limiter: waiting {:?} for provider '{}'",
                        wait, provider
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Claim a slot without waiting.
    pub fn try_acquire(&self, provider: &ProviderId) -> Result<(), MarketDataError> {
        self.check_budget(provider)?;
        self.try_record(provider)
            .map_err(|retry_after| MarketDataError::RateLimitExceeded {
                provider: provider.to_string(),
                retry_after,
            })
    }

    /// Calls recorded for `provider` in the last 60 seconds.
    pub fn calls_in_window(&self, provider: &ProviderId) -> usize {
        let mut windows = self.lock_windows();
        match windows.get_mut(provider.as_ref()) {
            Some(window) => {
                window.prune(Instant::now());
                window.calls.len()
            }
            None => 0,
        }
    }

    /// Forget recorded calls for a provider, keeping its limit.
    pub fn reset(&self, provider: &ProviderId) {
        if let Some(window) = self.lock_windows().get_mut(provider.as_ref()) {
            window.calls.clear();
        }
    }
}
