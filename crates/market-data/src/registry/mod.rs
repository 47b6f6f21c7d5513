//! Provider orchestration.
//!
//! This module provides the cascading fetcher and the guards around it:
//! - Priority-ordered provider fallback with write-through caching
//! - Sliding-window rate limiting per provider
//! - Circuit breaking for fault tolerance
//! - Candle validation

mod circuit_breaker;
mod fetcher;
mod policy;
mod rate_limiter;
mod skip_reason;
mod validator;

pub use circuit_breaker::{
    Admission, CircuitBreaker, CircuitBreakerConfig, CircuitMetrics, CircuitState,
};
pub use fetcher::{CascadingFetcher, FetchStats, ProviderStats};
pub use policy::{FetchPolicy, UsageAccounting};
pub use rate_limiter::RateLimiter;
pub use skip_reason::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use validator::{CandleValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
