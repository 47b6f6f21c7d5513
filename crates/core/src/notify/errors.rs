use thiserror::Error;

/// Alert delivery failures. Always logged by the caller, never fatal.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notifier '{channel}' is not configured: {reason}")]
    NotConfigured {
        channel: &'static str,
        reason: String,
    },

    #[error("Request to '{channel}' failed: {message}")]
    Transport {
        channel: &'static str,
        message: String,
    },

    #[error("'{channel}' rejected the message (HTTP {status}): {description}")]
    Rejected {
        channel: &'static str,
        status: u16,
        description: String,
    },
}
