use std::sync::Arc;

use log::{info, warn};

use super::log_notifier::LogNotifier;
use super::telegram::{TelegramConfig, TelegramNotifier};
use super::traits::Notifier;
use crate::errors::Result;

/// Pick the alert channel from the configured Telegram credentials.
///
/// Both present selects Telegram, and a blank value is an error. Anything
/// less falls back to the log.
pub fn notifier_from_credentials(
    bot_token: Option<&str>,
    chat_id: Option<&str>,
) -> Result<Arc<dyn Notifier>> {
    match (bot_token, chat_id) {
        (Some(token), Some(chat)) => {
            let notifier = TelegramNotifier::new(TelegramConfig::new(token, chat))?;
            info!("Alerts go to Telegram chat {}", chat);
            Ok(Arc::new(notifier))
        }
        _ => {
            warn!("Telegram not configured; alerts are only logged");
            Ok(Arc::new(LogNotifier::new()))
        }
    }
}
