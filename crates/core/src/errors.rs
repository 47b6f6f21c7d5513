//! Core error types for the breakout scanner.
//!
//! Scan failures have their own enum in [`crate::scanner`]; this root type
//! covers setup: tier validation and alert channel selection.

use thiserror::Error;

use crate::notify::NotifyError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),
}
