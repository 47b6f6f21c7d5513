//! Candle validation.
//!
//! Provider responses are checked bar by bar before they reach the cache:
//! - OHLC invariants (high >= low)
//! - Non-negative prices and volume
//!
//! Hard failures drop the bar. A response with no surviving bars counts as
//! the provider's failure so the fetcher falls through to the next one.

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::Candle;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the bar.
    Hard,
    /// Keep the bar, log it.
    Soft,
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    pub reject_negative_prices: bool,
    pub reject_invalid_ohlc: bool,
    /// Sanity ceiling; prices above it are logged, not rejected.
    pub max_price: Option<Decimal>,
    pub warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_negative_prices: true,
            reject_invalid_ohlc: true,
            max_price: Some(Decimal::from(1_000_000i64)),
            warn_on_zero_volume: true,
        }
    }
}

pub struct CandleValidator {
    config: ValidatorConfig,
}

impl CandleValidator {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Collect every issue with a single bar.
    pub fn inspect(&self, candle: &Candle) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.config.reject_negative_prices {
            let prices = [
                ("open", candle.open),
                ("high", candle.high),
                ("low", candle.low),
                ("close", candle.close),
            ];
            for (name, value) in prices {
                if value < Decimal::ZERO {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Hard,
                        message: format!("Negative {} price: {}", name, value),
                    });
                }
            }
        }

        if self.config.reject_invalid_ohlc {
            if candle.high < candle.low {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!(
                        "High ({}) is less than Low ({})",
                        candle.high, candle.low
                    ),
                });
            } else if candle.close < candle.low || candle.close > candle.high {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!(
                        "Close ({}) is outside High/Low range ({}-{})",
                        candle.close, candle.low, candle.high
                    ),
                });
            }
        }

        if let Some(max_price) = self.config.max_price {
            if candle.high > max_price {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!(
                        "High price ({}) exceeds max threshold ({})",
                        candle.high, max_price
                    ),
                });
            }
        }

        if candle.volume < Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative volume: {}", candle.volume),
            });
        }

        issues
    }

    /// Validate a single bar.
    pub fn validate(&self, candle: &Candle) -> Result<(), MarketDataError> {
        let issues = self.inspect(candle);
        let hard: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !hard.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: format!("{}: {}", candle.timestamp, hard.join("; ")),
            });
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!(
                "Candle validation warning at {}: {}",
                candle.timestamp, issue.message
            );
        }
        Ok(())
    }

    /// Keep the valid bars of a provider response.
    ///
    /// Fails when nothing survives, including an empty response.
    pub fn validate_series(
        &self,
        provider: &str,
        symbol: &str,
        candles: Vec<Candle>,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let total = candles.len();
        let mut zero_volume = 0usize;
        let mut last_error = None;

        let valid: Vec<Candle> = candles
            .into_iter()
            .filter(|candle| match self.validate(candle) {
                Ok(()) => {
                    if candle.volume.is_zero() {
                        zero_volume += 1;
                    }
                    true
                }
                Err(err) => {
                    last_error = Some(err);
                    false
                }
            })
            .collect();

        if self.config.warn_on_zero_volume && zero_volume > 0 {
            debug!(
                "{} returned {} zero-volume bars for {}",
                provider, zero_volume, symbol
            );
        }

        if valid.is_empty() {
            let message = match last_error {
                Some(err) => format!(
                    "{} returned no valid candles for {}: {}",
                    provider, symbol, err
                ),
                None => format!("{} returned no candles for {}", provider, symbol),
            };
            return Err(MarketDataError::ValidationFailed { message });
        }

        if valid.len() < total {
            warn!(
                "{} returned {} invalid candles for {}, kept {}",
                provider,
                total - valid.len(),
                symbol,
                valid.len()
            );
        }
        Ok(valid)
    }
}

impl Default for CandleValidator {
    fn default() -> Self {
        Self::new()
    }
}
