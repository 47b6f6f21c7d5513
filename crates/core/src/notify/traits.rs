use async_trait::async_trait;

use super::errors::NotifyError;

/// An alert delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &'static str;

    /// Deliver one preformatted message.
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}
