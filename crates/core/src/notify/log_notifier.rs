use std::sync::Mutex;

use async_trait::async_trait;
use log::info;

use super::errors::NotifyError;
use super::traits::Notifier;

/// Writes alerts to the log. Used when no delivery channel is configured.
///
/// Keeps the delivered messages so tests and status output can inspect them.
#[derive(Debug, Default)]
pub struct LogNotifier {
    sent: Mutex<Vec<String>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!("ALERT:\n{}", message);
        match self.sent.lock() {
            Ok(mut sent) => sent.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
        Ok(())
    }
}
