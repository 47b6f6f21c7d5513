//! Breakout Scanner Market Data Crate
//!
//! Budget-aware intraday candle fetching for the breakout scanner.
//!
//! # Overview
//!
//! The market data crate provides:
//! - Multiple providers behind one trait: FMP, Twelve Data, Alpha Vantage,
//!   Yahoo Finance
//! - Cascading fallback in priority order with per-provider circuit breaking
//! - A disk-backed candle cache with per-interval TTLs
//! - Daily usage accounting and per-minute rate limiting
//! - Budget-driven symbol selection
//!
//! # Architecture
//!
//! ```text
//! +-------------------+     +------------------+
//! | SymbolPrioritizer | <-- |   UsageTracker   |  (daily budget)
//! +-------------------+     +------------------+
//!           |                        ^
//!           v                        |
//! +-------------------+     +------------------+
//! | CascadingFetcher  | --> |    CacheStore    |  (symbol, interval) -> candles
//! +-------------------+     +------------------+
//!           |
//!           v
//! +-------------------+
//! |   RateLimiter     |  (per-minute window, daily budget check)
//! +-------------------+
//!           |
//!           v
//! +-------------------+
//! |     Provider      |  (FMP -> Twelve Data -> Alpha Vantage -> Yahoo)
//! +-------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Candle`] - One OHLCV bar
//! - [`Interval`] - Bar size and its default cache lifetime
//! - [`ProviderQuota`] - Static daily/per-minute limits and priority rank
//! - [`CacheStore`] - Candle series cache with expiry
//! - [`UsageTracker`] - Persistent daily call counters
//! - [`CascadingFetcher`] - Cache-first, priority-ordered fetch

pub mod cache;
pub mod clock;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod prioritizer;
pub mod provider;
pub mod registry;
pub mod usage;

// Re-export all public types from models
pub use models::{normalize_series, Candle, Interval, ProviderId, ProviderQuota};

pub use cache::{CacheEntry, CacheKey, CacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{MarketDataError, RetryClass};
pub use persistence::{JsonFileBackend, MemoryBackend, SnapshotBackend};
pub use prioritizer::{BudgetPolicy, BudgetScope, SymbolPrioritizer};
pub use usage::{UsageRecord, UsageRecovery, UsageTracker};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::fmp::FmpProvider;
pub use provider::twelve_data::TwelveDataProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities};

// Re-export registry types
pub use registry::{
    CandleValidator, CascadingFetcher, CircuitBreaker, CircuitBreakerConfig, CircuitMetrics,
    CircuitState,
    FetchDiagnostics, FetchPolicy, FetchStats, ProviderAttempt, RateLimiter, SkipReason,
    UsageAccounting, ValidationSeverity,
};
