//! Alert delivery.
//!
//! Signals are rendered once with [`format_alert`] and handed to a
//! [`Notifier`]. Delivery failures are reported to the caller, which logs
//! them and moves on.

mod channel;
mod errors;
mod format;
mod log_notifier;
mod telegram;
mod traits;

pub use channel::notifier_from_credentials;
pub use errors::NotifyError;
pub use format::format_alert;
pub use log_notifier::LogNotifier;
pub use telegram::{TelegramConfig, TelegramNotifier};
pub use traits::Notifier;
