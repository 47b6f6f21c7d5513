//! Market data provider trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Candle, Interval, ProviderQuota};

use super::capabilities::ProviderCapabilities;

/// A source of intraday OHLCV candles.
///
/// Implementations only talk to their endpoint and normalize the response.
/// Caching, pacing, budget accounting and fallback belong to the
/// [`CascadingFetcher`](crate::registry::CascadingFetcher).
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use breakout_market_data::provider::{MarketDataProvider, ProviderCapabilities};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn quota(&self) -> ProviderQuota {
///         ProviderQuota::metered(100, 5, 2)
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::all_intervals()
///     }
///
///     // ... implement fetch_candles
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier, e.g. "FMP" or "YAHOO".
    ///
    /// Used for logging, usage accounting and circuit breaker tracking.
    fn id(&self) -> &'static str;

    /// Daily and per-minute limits plus fallback position.
    fn quota(&self) -> ProviderQuota;

    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch recent candles for `symbol`.
    ///
    /// Returns bars in ascending timestamp order with no duplicate
    /// timestamps, or a classified error.
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError>;
}
