//! Market data models
//!
//! This module contains the core data types shared by the fetch pipeline:
//! - `types` - Type aliases for common identifiers (ProviderId)
//! - `interval` - Candle intervals and their default cache lifetimes
//! - `candle` - OHLCV bars and series normalization
//! - `quota` - Static per-provider quotas (ProviderQuota)

mod candle;
mod interval;
mod quota;
mod types;

pub use candle::{normalize_series, Candle};
pub use interval::Interval;
pub use quota::ProviderQuota;
pub use types::ProviderId;
