//! Yahoo Finance market data provider.
//!
//! The unmetered last resort of the fallback chain. Intraday bars come from
//! the chart endpoint through `yahoo_finance_api`, requested by range rather
//! than by count: Yahoo only serves 1m/5m bars for the last few days.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{Candle, Interval, ProviderQuota};
use crate::provider::{MarketDataProvider, ProviderCapabilities};

pub const PROVIDER_ID: &str = "YAHOO";

const DEFAULT_QUOTA: ProviderQuota = ProviderQuota::unmetered(4);

pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    output_size: usize,
}

impl YahooProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        Ok(Self {
            connector,
            output_size: 120,
        })
    }

    pub fn with_output_size(mut self, output_size: usize) -> Self {
        self.output_size = output_size;
        self
    }

    /// Yahoo interval name and the range that still serves it.
    fn chart_params(interval: Interval) -> (&'static str, &'static str) {
        match interval {
            Interval::OneMinute => ("1m", "5d"),
            Interval::FiveMinutes => ("5m", "5d"),
            Interval::FifteenMinutes => ("15m", "1mo"),
            Interval::ThirtyMinutes => ("30m", "3mo"),
            Interval::OneHour => ("1h", "3mo"),
        }
    }

    /// Convert a Yahoo bar. Bars with missing prices (NaN) are dropped.
    fn yahoo_quote_to_candle(quote: &yahoo::Quote) -> Option<Candle> {
        Self::bar_to_candle(
            quote.timestamp as i64,
            [quote.open, quote.high, quote.low, quote.close],
            quote.volume,
        )
    }

    fn bar_to_candle(timestamp: i64, ohlc: [f64; 4], volume: u64) -> Option<Candle> {
        let timestamp: DateTime<Utc> = Utc.timestamp_opt(timestamp, 0).single()?;
        let [open, high, low, close] =
            ohlc.map(|v| Decimal::from_f64_retain(v).map(|d| d.round_dp(4)));
        Some(Candle::new(
            timestamp,
            open?,
            high?,
            low?,
            close?,
            Decimal::from_u64(volume).unwrap_or_default(),
        ))
    }

    fn map_error(symbol: &str, err: yahoo::YahooError) -> MarketDataError {
        if matches!(err, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
            return MarketDataError::SymbolNotFound {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            };
        }
        let message = err.to_string();
        if message.contains("429") || message.to_ascii_lowercase().contains("too many requests") {
            MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            }
        } else {
            MarketDataError::Transient {
                provider: PROVIDER_ID.to_string(),
                message,
            }
        }
    }

    fn to_candles(&self, quotes: &[yahoo::Quote]) -> Vec<Candle> {
        let mut candles: Vec<Candle> = quotes
            .iter()
            .filter_map(Self::yahoo_quote_to_candle)
            .collect();
        candles.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        if self.output_size > 0 && candles.len() > self.output_size {
            candles.drain(..candles.len() - self.output_size);
        }
        candles
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn quota(&self) -> ProviderQuota {
        DEFAULT_QUOTA
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::all_intervals()
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let (yahoo_interval, range) = Self::chart_params(interval);
        debug!(
            "Fetching {} bars over {} for {} from Yahoo",
            yahoo_interval, range, symbol
        );

        let response = self
            .connector
            .get_quote_range(symbol, yahoo_interval, range)
            .await
            .map_err(|e| Self::map_error(symbol, e))?;

        let quotes = response.quotes().map_err(|e| {
            warn!("No quotes returned for {}: {}", symbol, e);
            Self::map_error(symbol, e)
        })?;

        let candles = self.to_candles(&quotes);
        if candles.is_empty() {
            return Err(MarketDataError::SymbolNotFound {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }
        Ok(candles)
    }
}
