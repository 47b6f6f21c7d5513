//! Shared HTTP plumbing for the REST providers.
//!
//! Maps transport failures and status codes onto [`MarketDataError`] so every
//! provider classifies them the same way, and keeps API keys out of logs.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client with a per-request timeout, falling back to defaults if
/// the builder fails.
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Replace every occurrence of `secret` with `***`.
pub(crate) fn mask(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "***")
}

/// Map a transport error.
pub(crate) fn map_transport_error(provider: &str, err: reqwest::Error) -> MarketDataError {
    if err.is_timeout() {
        MarketDataError::Timeout {
            provider: provider.to_string(),
        }
    } else if err.is_connect() || err.is_request() {
        MarketDataError::Transient {
            provider: provider.to_string(),
            message: err.without_url().to_string(),
        }
    } else {
        MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: err.without_url().to_string(),
        }
    }
}

/// Map a non-success status code.
pub(crate) fn map_status(provider: &str, symbol: &str, status: StatusCode) -> MarketDataError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MarketDataError::Unauthorized {
            provider: provider.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => MarketDataError::RateLimited {
            provider: provider.to_string(),
        },
        StatusCode::NOT_FOUND => MarketDataError::SymbolNotFound {
            provider: provider.to_string(),
            symbol: symbol.to_string(),
        },
        s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => {
            MarketDataError::Transient {
                provider: provider.to_string(),
                message: format!("HTTP {}", s),
            }
        }
        s => MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("HTTP {}", s),
        },
    }
}

/// GET `url` and return the body of a successful response.
pub(crate) async fn get_text(
    client: &Client,
    provider: &str,
    symbol: &str,
    url: Url,
    secret: &str,
) -> Result<String, MarketDataError> {
    debug!("{} request: {}", provider, mask(url.as_str(), secret));

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| map_transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(map_status(provider, symbol, status));
    }

    response
        .text()
        .await
        .map_err(|e| map_transport_error(provider, e))
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    provider: &str,
    body: &str,
) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
        provider: provider.to_string(),
        message: format!("Failed to parse response: {}", e),
    })
}

/// Parse an exchange-local timestamp (`YYYY-MM-DD HH:MM:SS` or
/// `YYYY-MM-DD HH:MM`) in New York time and convert it to UTC.
///
/// Ambiguous times at the end of daylight saving resolve to the earlier
/// instant; times skipped by the spring-forward gap are rejected.
pub(crate) fn parse_exchange_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()?;
    New_York
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decimal from a string or JSON number field.
pub(crate) fn parse_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        // Number's Display is the shortest round-trip form, so 185.9 stays 185.9.
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_mask_hides_key() {
        assert_eq!(
            mask("https://x.test/q?apikey=abc123&s=1", "abc123"),
            "https://x.test/q?apikey=***&s=1"
        );
        assert_eq!(mask("no secret", ""), "no secret");
    }

    #[test]
    fn test_status_mapping() {
        let err = map_status("FMP", "AAPL", StatusCode::FORBIDDEN);
        assert!(matches!(err, MarketDataError::Unauthorized { .. }));

        let err = map_status("FMP", "AAPL", StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(err, MarketDataError::RateLimited { .. }));

        let err = map_status("FMP", "AAPL", StatusCode::NOT_FOUND);
        assert!(matches!(err, MarketDataError::SymbolNotFound { .. }));

        let err = map_status("FMP", "AAPL", StatusCode::BAD_GATEWAY);
        assert!(matches!(err, MarketDataError::Transient { .. }));

        let err = map_status("FMP", "AAPL", StatusCode::BAD_REQUEST);
        assert!(matches!(err, MarketDataError::ProviderError { .. }));
    }

    #[test]
    fn test_exchange_time_converts_to_utc() {
        // EST (UTC-5) in January, EDT (UTC-4) in July.
        let winter = parse_exchange_time("2024-01-10 09:30:00").unwrap();
        assert_eq!(winter, Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap());

        let summer = parse_exchange_time("2024-07-10 09:30").unwrap();
        assert_eq!(summer, Utc.with_ymd_and_hms(2024, 7, 10, 13, 30, 0).unwrap());

        assert!(parse_exchange_time("2024-03-10 02:30:00").is_none());
        assert!(parse_exchange_time("yesterday").is_none());
    }

    #[test]
    fn test_parse_decimal_accepts_strings_and_numbers() {
        assert_eq!(parse_decimal(&json!("187.1500")), Some(dec!(187.15)));
        assert_eq!(parse_decimal(&json!(1200)), Some(dec!(1200)));
        assert_eq!(parse_decimal(&json!(185.9)), Some(dec!(185.9)));
        assert_eq!(parse_decimal(&json!(null)), None);
        assert_eq!(parse_decimal(&json!("n/a")), None);
    }
}
