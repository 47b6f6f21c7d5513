//! Tier scan cycle.

mod errors;
mod model;
mod service;
mod traits;

pub use errors::ScanError;
pub use model::{ScanReport, SkippedSymbol};
pub use service::TierScanner;
pub use traits::CandleSource;
