//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use std::time::Duration;

use thiserror::Error;

use crate::models::Interval;
use crate::registry::{FetchDiagnostics, ProviderAttempt};

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines how the cascading fetcher should handle the error.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider rejected our credentials (HTTP 401/403 or an invalid
    /// key message in the body).
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// The provider that rejected the key
        provider: String,
    },

    /// The provider throttled the request (HTTP 429 or a rate limit note).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// Connection failure or server-side (5xx) error.
    #[error("Transient error: {provider} - {message}")]
    Transient {
        /// The provider that failed
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The provider doesn't know this symbol.
    #[error("Symbol not found: {symbol} ({provider})")]
    SymbolNotFound {
        /// The provider that rejected the symbol
        provider: String,
        /// The requested symbol
        symbol: String,
    },

    /// A provider-specific error: unexpected payload, unknown status, etc.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider returned bars that failed validation.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// The provider's daily quota is spent. Not waitable.
    #[error("Daily budget exhausted: {provider}")]
    BudgetExhausted {
        /// The provider whose budget is spent
        provider: String,
    },

    /// A non-blocking acquire found the per-minute window full.
    #[error("Rate limit exceeded: {provider}, retry in {retry_after:?}")]
    RateLimitExceeded {
        /// The provider whose window is full
        provider: String,
        /// Time until the oldest call leaves the window
        retry_after: Duration,
    },

    /// No providers are registered.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// Every provider was tried or skipped and none produced data.
    #[error(
        "Data unavailable for {symbol} {interval}: {}",
        FetchDiagnostics::summarize(.attempts)
    )]
    DataUnavailable {
        /// The requested symbol
        symbol: String,
        /// The requested interval
        interval: Interval,
        /// What happened at each provider, in fallback order
        attempts: Vec<ProviderAttempt>,
    },

    /// The persisted cache file could not be parsed.
    #[error("Cache file corrupted: {0}")]
    CacheCorruption(String),

    /// The persisted usage file could not be read or parsed.
    #[error("Usage file corrupted: {0}")]
    UsageFileCorruption(String),

    /// Unknown interval name in configuration.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Reading or writing persisted state failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Encoding persisted state failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use breakout_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "FMP".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = MarketDataError::Unauthorized { provider: "FMP".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::DisableProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Unauthorized { .. } => RetryClass::DisableProvider,

            Self::RateLimited { .. } => RetryClass::FailoverWithPenalty,

            Self::Timeout { .. } | Self::Transient { .. } | Self::Network(_) => {
                RetryClass::RetryThenFailover
            }

            Self::SymbolNotFound { .. }
            | Self::ProviderError { .. }
            | Self::ValidationFailed { .. }
            | Self::BudgetExhausted { .. }
            | Self::RateLimitExceeded { .. } => RetryClass::NextProvider,

            Self::NoProvidersAvailable
            | Self::DataUnavailable { .. }
            | Self::CacheCorruption(_)
            | Self::UsageFileCorruption(_)
            | Self::InvalidInterval(_)
            | Self::Persistence(_)
            | Self::Serialization(_) => RetryClass::Never,
        }
    }
}
