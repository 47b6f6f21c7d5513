use thiserror::Error;

use breakout_market_data::MarketDataError;

/// Failures that abort a whole tier scan.
///
/// Per-symbol fetch failures are not errors at this level: the symbol is
/// skipped and recorded in the scan report.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Tier '{tier}' has no symbols")]
    EmptyTier { tier: String },

    #[error("Tier '{tier}' cannot fetch data: {source}")]
    MarketData {
        tier: String,
        #[source]
        source: MarketDataError,
    },
}
