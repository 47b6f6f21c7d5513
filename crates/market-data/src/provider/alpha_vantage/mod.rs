//! Alpha Vantage market data provider implementation.
//!
//! Intraday bars come from the `TIME_SERIES_INTRADAY` function. Alpha
//! Vantage reports most failures with HTTP 200 and an `Error Message`,
//! `Note` or `Information` field, so those are inspected before the series.
//!
//! Note: the free tier is limited to 25 calls per day and 5 per minute.

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{Candle, Interval, ProviderQuota};
use crate::provider::http::{self, parse_exchange_time};
use crate::provider::{MarketDataProvider, ProviderCapabilities};

const BASE_URL: &str = "https://www.alphavantage.co/query";
pub const PROVIDER_ID: &str = "ALPHA_VANTAGE";

const DEFAULT_QUOTA: ProviderQuota = ProviderQuota::metered(25, 5, 3);

#[derive(Debug, Deserialize)]
struct IntradayResponse {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    /// Holds "Meta Data" and the "Time Series (Xmin)" object.
    #[serde(flatten)]
    rest: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct IntradayBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
    output_size: usize,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http::build_client(std::time::Duration::from_secs(15)),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            output_size: 120,
        }
    }

    pub fn with_output_size(mut self, output_size: usize) -> Self {
        self.output_size = output_size;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn interval_param(interval: Interval) -> &'static str {
        match interval {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::OneHour => "60min",
        }
    }

    fn url(&self, symbol: &str, interval: Interval) -> Result<Url, MarketDataError> {
        // "compact" returns the latest 100 bars; "full" is needed beyond that.
        let size = if self.output_size == 0 || self.output_size > 100 {
            "full"
        } else {
            "compact"
        };
        Url::parse_with_params(
            &self.base_url,
            &[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", Self::interval_param(interval)),
                ("outputsize", size),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build URL: {}", e),
        })
    }

    fn is_rate_limit_message(msg: &str) -> bool {
        let lower = msg.to_ascii_lowercase();
        lower.contains("api call frequency")
            || lower.contains("rate limit")
            || lower.contains("requests per day")
    }

    fn is_key_message(msg: &str) -> bool {
        let lower = msg.to_ascii_lowercase();
        lower.contains("apikey") && (lower.contains("invalid") || lower.contains("missing"))
    }

    /// Check the API-level error fields.
    fn check_api_error(response: &IntradayResponse, symbol: &str) -> Result<(), MarketDataError> {
        for msg in [&response.note, &response.information, &response.error_message]
            .into_iter()
            .flatten()
        {
            if Self::is_rate_limit_message(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            if Self::is_key_message(msg) {
                return Err(MarketDataError::Unauthorized {
                    provider: PROVIDER_ID.to_string(),
                });
            }
        }

        if let Some(msg) = &response.error_message {
            if msg.contains("Invalid API call") {
                return Err(MarketDataError::SymbolNotFound {
                    provider: PROVIDER_ID.to_string(),
                    symbol: symbol.to_string(),
                });
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        if let Some(msg) = &response.information {
            warn!("Alpha Vantage info: {}", msg);
        }
        Ok(())
    }

    fn parse_response(
        body: &str,
        symbol: &str,
        interval: Interval,
        output_size: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let mut response: IntradayResponse = http::parse_body(PROVIDER_ID, body)?;
        Self::check_api_error(&response, symbol)?;

        let series_key = format!("Time Series ({})", Self::interval_param(interval));
        let series = response.rest.remove(&series_key).ok_or_else(|| {
            MarketDataError::SymbolNotFound {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            }
        })?;
        let bars: HashMap<String, IntradayBar> =
            serde_json::from_value(series).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse {}: {}", series_key, e),
            })?;

        let mut candles: Vec<Candle> = bars
            .into_iter()
            .filter_map(|(ts, bar)| {
                Some(Candle::new(
                    parse_exchange_time(&ts)?,
                    bar.open.trim().parse().ok()?,
                    bar.high.trim().parse().ok()?,
                    bar.low.trim().parse().ok()?,
                    bar.close.trim().parse().ok()?,
                    bar.volume.trim().parse().unwrap_or_default(),
                ))
            })
            .collect();
        candles.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        if output_size > 0 && candles.len() > output_size {
            candles.drain(..candles.len() - output_size);
        }
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
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
        let url = self.url(symbol, interval)?;
        let body = http::get_text(&self.client, PROVIDER_ID, symbol, url, &self.api_key).await?;
        let candles = Self::parse_response(&body, symbol, interval, self.output_size)?;
        debug!(
            "Alpha Vantage: parsed {} candles for {} {}",
            candles.len(),
            symbol,
            interval
        );
        Ok(candles)
    }
}
