//! Telegram Bot API notifier.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;

use super::errors::NotifyError;
use super::traits::Notifier;

const API_BASE: &str = "https://api.telegram.org";
const CHANNEL: &str = "telegram";

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// `Markdown` unless overridden.
    pub parse_mode: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            parse_mode: "Markdown".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    client: reqwest::Client,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.trim().is_empty() || config.chat_id.trim().is_empty() {
            return Err(NotifyError::NotConfigured {
                channel: CHANNEL,
                reason: "bot token and chat id are required".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Transport {
                channel: CHANNEL,
                message: e.to_string(),
            })?;
        Ok(Self {
            config,
            client,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point at another Bot API host, e.g. a local test server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token)
    }

    fn payload(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": self.config.parse_mode,
            "disable_web_page_preview": true,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        debug!("Sending Telegram message to chat {}", self.config.chat_id);

        // The token is part of the path, so keep the URL out of the error.
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.payload(message))
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                channel: CHANNEL,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            other => {
                let description = other
                    .and_then(|r| r.description)
                    .unwrap_or_else(|| body.chars().take(200).collect());
                warn!("Telegram rejected message: HTTP {} {}", status, description);
                Err(NotifyError::Rejected {
                    channel: CHANNEL,
                    status: status.as_u16(),
                    description,
                })
            }
        }
    }
}
