//! Breakout scanner core - universe, detection, alerting.
//!
//! This crate turns candles into alerts. It is provider-agnostic: candles
//! arrive through [`scanner::CandleSource`], which the
//! `breakout-market-data` cascading fetcher implements.
//!
//! ```text
//! Tier ──► SymbolPrioritizer ──► CandleSource ──► BreakoutDetector ──► Notifier
//!            (budget)              (cache/fallback)   (Wyckoff)          (Telegram/log)
//! ```

pub mod errors;
pub mod notify;
pub mod scanner;
pub mod signals;
pub mod universe;

pub use errors::Error;
pub use errors::Result;

pub use notify::{format_alert, LogNotifier, Notifier, TelegramConfig, TelegramNotifier};
pub use scanner::{CandleSource, ScanReport, TierScanner};
pub use signals::{BreakoutDetector, Signal, WyckoffBreakoutDetector};
pub use universe::Tier;
