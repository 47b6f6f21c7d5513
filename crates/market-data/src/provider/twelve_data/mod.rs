//! Twelve Data provider.
//!
//! Uses the `/time_series` endpoint with `order=ASC`. Errors arrive as a
//! `{"status": "error", "code": ..., "message": ...}` envelope, usually with
//! HTTP 200, so the body code is classified as well as the HTTP status.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{Candle, Interval, ProviderQuota};
use crate::provider::http::{self, parse_decimal, parse_exchange_time};
use crate::provider::{MarketDataProvider, ProviderCapabilities};

const BASE_URL: &str = "https://api.twelvedata.com/time_series";
pub const PROVIDER_ID: &str = "TWELVE_DATA";

const DEFAULT_QUOTA: ProviderQuota = ProviderQuota::metered(25, 5, 2);

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Vec<TimeSeriesValue>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: serde_json::Value,
    high: serde_json::Value,
    low: serde_json::Value,
    close: serde_json::Value,
    #[serde(default)]
    volume: serde_json::Value,
}

pub struct TwelveDataProvider {
    client: Client,
    api_key: String,
    base_url: String,
    output_size: usize,
}

impl TwelveDataProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http::build_client(http::DEFAULT_TIMEOUT),
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
            Interval::OneHour => "1h",
        }
    }

    fn url(&self, symbol: &str, interval: Interval) -> Result<Url, MarketDataError> {
        let output_size = if self.output_size == 0 {
            // API maximum.
            "5000".to_string()
        } else {
            self.output_size.to_string()
        };
        Url::parse_with_params(
            &self.base_url,
            &[
                ("symbol", symbol),
                ("interval", Self::interval_param(interval)),
                ("outputsize", output_size.as_str()),
                ("apikey", self.api_key.as_str()),
                ("order", "ASC"),
            ],
        )
        .map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build URL: {}", e),
        })
    }

    fn classify_error(code: Option<u16>, message: String, symbol: &str) -> MarketDataError {
        let provider = PROVIDER_ID.to_string();
        match code {
            Some(401) | Some(403) => MarketDataError::Unauthorized { provider },
            Some(429) => MarketDataError::RateLimited { provider },
            Some(404) => MarketDataError::SymbolNotFound {
                provider,
                symbol: symbol.to_string(),
            },
            Some(400) if message.to_ascii_lowercase().contains("symbol") => {
                MarketDataError::SymbolNotFound {
                    provider,
                    symbol: symbol.to_string(),
                }
            }
            Some(c) if c >= 500 => MarketDataError::Transient { provider, message },
            _ => MarketDataError::ProviderError { provider, message },
        }
    }

    fn parse_response(body: &str, symbol: &str) -> Result<Vec<Candle>, MarketDataError> {
        let response: TimeSeriesResponse = http::parse_body(PROVIDER_ID, body)?;

        if response.status.as_deref() == Some("error") {
            let message = response
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Self::classify_error(response.code, message, symbol));
        }

        if response.values.is_empty() {
            return Err(MarketDataError::SymbolNotFound {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        Ok(response
            .values
            .into_iter()
            .filter_map(|v| {
                Some(Candle::new(
                    parse_exchange_time(&v.datetime)?,
                    parse_decimal(&v.open)?,
                    parse_decimal(&v.high)?,
                    parse_decimal(&v.low)?,
                    parse_decimal(&v.close)?,
                    parse_decimal(&v.volume).unwrap_or_default(),
                ))
            })
            .collect())
    }
}

#[async_trait]
impl MarketDataProvider for TwelveDataProvider {
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
        let candles = Self::parse_response(&body, symbol)?;
        debug!(
            "Twelve Data: parsed {} candles for {} {}",
            candles.len(),
            symbol,
            interval
        );
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_url_parameters() {
        let provider = TwelveDataProvider::new("k").with_output_size(50);
        let url = provider.url("MSFT", Interval::FiveMinutes).unwrap();
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.contains(&("interval".to_string(), "5min".to_string())));
        assert!(query.contains(&("outputsize".to_string(), "50".to_string())));
        assert!(query.contains(&("order".to_string(), "ASC".to_string())));
    }

    #[test]
    fn test_parse_values() {
        let body = r#"{
            "meta": {"symbol": "MSFT", "interval": "5min", "exchange_timezone": "America/New_York"},
            "values": [
                {"datetime": "2024-07-10 09:30:00", "open": "455.10", "high": "456.00", "low": "454.90", "close": "455.80", "volume": "210000"},
                {"datetime": "2024-07-10 09:35:00", "open": "455.80", "high": "456.40", "low": "455.50", "close": "456.20", "volume": "180000"}
            ],
            "status": "ok"
        }"#;
        let candles = TwelveDataProvider::parse_response(body, "MSFT").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(
            candles[0].timestamp,
            Utc.with_ymd_and_hms(2024, 7, 10, 13, 30, 0).unwrap()
        );
        assert_eq!(candles[1].close, dec!(456.20));
    }

    #[test]
    fn test_error_envelope_classification() {
        let cases = [
            (r#"{"code": 401, "message": "apikey parameter is incorrect", "status": "error"}"#, "unauthorized"),
            (r#"{"code": 429, "message": "You have run out of API credits", "status": "error"}"#, "rate_limited"),
            (r#"{"code": 400, "message": "**symbol** not found: ZZZZ", "status": "error"}"#, "not_found"),
            (r#"{"code": 500, "message": "internal error", "status": "error"}"#, "transient"),
        ];
        for (body, expected) in cases {
            let err = TwelveDataProvider::parse_response(body, "ZZZZ").unwrap_err();
            let kind = match err {
                MarketDataError::Unauthorized { .. } => "unauthorized",
                MarketDataError::RateLimited { .. } => "rate_limited",
                MarketDataError::SymbolNotFound { .. } => "not_found",
                MarketDataError::Transient { .. } => "transient",
                _ => "other",
            };
            assert_eq!(kind, expected, "body: {}", body);
        }
    }

    #[test]
    fn test_empty_values_is_not_found() {
        let err = TwelveDataProvider::parse_response(r#"{"status": "ok", "values": []}"#, "AAPL")
            .unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound { .. }));
    }
}
