//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capability descriptors
//! - Shared HTTP error mapping for the REST providers
//! - Concrete providers, in default fallback order: FMP, Twelve Data,
//!   Alpha Vantage, Yahoo
//!
//! Providers are stateless with respect to budgets: quotas are declared
//! through [`MarketDataProvider::quota`] and enforced by the fetcher.

mod capabilities;
mod http;
mod traits;

pub mod alpha_vantage;
pub mod fmp;
pub mod twelve_data;
pub mod yahoo;

pub use capabilities::ProviderCapabilities;
pub use traits::MarketDataProvider;
