//! Breakout detection.
//!
//! - **Traits** (`traits.rs`) - `BreakoutDetector`, a pure function over a
//!   candle window
//! - **Models** (`model.rs`) - `Signal` and its ATR risk plan
//! - **Indicators** (`indicators.rs`) - EMA, ATR and averages in `Decimal`
//! - **Wyckoff** (`wyckoff.rs`) - consolidation breakout with volume and
//!   EMA trend confirmation

pub mod indicators;
mod model;
mod traits;
mod wyckoff;

pub use model::{RiskPlan, Signal, VolumeKind};
pub use traits::BreakoutDetector;
pub use wyckoff::{DetectorConfig, WyckoffBreakoutDetector};
