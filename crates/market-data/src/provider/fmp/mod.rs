//! Financial Modeling Prep provider.
//!
//! Intraday bars come from `/api/v3/historical-chart/{interval}/{symbol}`.
//! The response is a JSON array, newest bar first, with `date` in exchange
//! local time. The primary paid tier: 250 calls per day, 10 per minute.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{Candle, Interval, ProviderQuota};
use crate::provider::http::{self, parse_decimal, parse_exchange_time};
use crate::provider::{MarketDataProvider, ProviderCapabilities};

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3/historical-chart";
pub const PROVIDER_ID: &str = "FMP";

const DEFAULT_QUOTA: ProviderQuota = ProviderQuota::metered(250, 10, 1);

#[derive(Debug, Deserialize)]
struct ChartBar {
    date: String,
    open: serde_json::Value,
    high: serde_json::Value,
    low: serde_json::Value,
    close: serde_json::Value,
    #[serde(default)]
    volume: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChartResponse {
    Bars(Vec<ChartBar>),
    Error {
        #[serde(rename = "Error Message")]
        error_message: String,
    },
}

pub struct FmpProvider {
    client: Client,
    api_key: String,
    base_url: String,
    output_size: usize,
}

impl FmpProvider {
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

    fn interval_path(interval: Interval) -> &'static str {
        match interval {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::OneHour => "1hour",
        }
    }

    fn url(&self, symbol: &str, interval: Interval) -> Result<Url, MarketDataError> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            Self::interval_path(interval),
            urlencoding::encode(symbol)
        );
        Url::parse_with_params(&raw, &[("apikey", self.api_key.as_str())]).map_err(|e| {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            }
        })
    }

    /// Turn a response body into ascending candles, keeping the newest
    /// `output_size` bars.
    fn parse_response(
        body: &str,
        symbol: &str,
        output_size: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let response: ChartResponse = http::parse_body(PROVIDER_ID, body)?;
        let bars = match response {
            ChartResponse::Bars(bars) => bars,
            ChartResponse::Error { error_message } => {
                let lower = error_message.to_ascii_lowercase();
                if lower.contains("api key") || lower.contains("apikey") {
                    return Err(MarketDataError::Unauthorized {
                        provider: PROVIDER_ID.to_string(),
                    });
                }
                if lower.contains("limit reach") {
                    return Err(MarketDataError::RateLimited {
                        provider: PROVIDER_ID.to_string(),
                    });
                }
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: error_message,
                });
            }
        };

        if bars.is_empty() {
            return Err(MarketDataError::SymbolNotFound {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        let take = if output_size == 0 { bars.len() } else { output_size };
        let mut candles: Vec<Candle> = bars
            .into_iter()
            .take(take)
            .filter_map(|bar| {
                Some(Candle::new(
                    parse_exchange_time(&bar.date)?,
                    parse_decimal(&bar.open)?,
                    parse_decimal(&bar.high)?,
                    parse_decimal(&bar.low)?,
                    parse_decimal(&bar.close)?,
                    parse_decimal(&bar.volume).unwrap_or_default(),
                ))
            })
            .collect();
        candles.reverse();
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataProvider for FmpProvider {
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
        let candles = Self::parse_response(&body, symbol, self.output_size)?;
        debug!("FMP: parsed {} candles for {} {}", candles.len(), symbol, interval);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    const BODY: &str = r#"[
        {"date": "2024-01-10 10:02:00", "open": 185.5, "low": 185.2, "high": 186.0, "close": 185.9, "volume": 120000},
        {"date": "2024-01-10 10:01:00", "open": 185.1, "low": 185.0, "high": 185.6, "close": 185.5, "volume": 98000},
        {"date": "2024-01-10 10:00:00", "open": 185.0, "low": 184.8, "high": 185.3, "close": 185.1, "volume": 150000}
    ]"#;

    #[test]
    fn test_provider_id_and_quota() {
        let provider = FmpProvider::new("key");
        assert_eq!(provider.id(), "FMP");
        assert_eq!(provider.quota().daily_limit, Some(250));
        assert_eq!(provider.quota().per_minute_limit, Some(10));
        assert_eq!(provider.quota().priority_rank, 1);
    }

    #[test]
    fn test_url_uses_fmp_interval_names() {
        let provider = FmpProvider::new("secret");
        let url = provider.url("BRK.B", Interval::OneHour).unwrap();
        assert_eq!(
            url.as_str(),
            "https://financialmodelingprep.com/api/v3/historical-chart/1hour/BRK.B?apikey=secret"
        );
    }

    #[test]
    fn test_parse_reverses_to_ascending_utc() {
        let candles = FmpProvider::parse_response(BODY, "AAPL", 120).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(
            candles[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap()
        );
        assert_eq!(candles[2].close, dec!(185.9));
        assert_eq!(candles[2].volume, dec!(120000));
    }

    #[test]
    fn test_parse_keeps_newest_bars() {
        let candles = FmpProvider::parse_response(BODY, "AAPL", 2).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, dec!(185.9));
    }

    #[test]
    fn test_parse_error_envelopes() {
        let err = FmpProvider::parse_response(
            r#"{"Error Message": "Invalid API KEY. Please retry or visit our documentation."}"#,
            "AAPL",
            120,
        )
        .unwrap_err();
        assert!(matches!(err, MarketDataError::Unauthorized { .. }));

        let err = FmpProvider::parse_response(
            r#"{"Error Message": "Limit Reach . Please upgrade your plan."}"#,
            "AAPL",
            120,
        )
        .unwrap_err();
        assert!(matches!(err, MarketDataError::RateLimited { .. }));

        let err = FmpProvider::parse_response("[]", "ZZZZ", 120).unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound { .. }));
    }
}
