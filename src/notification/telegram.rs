//! Telegram delivery implementation.
//!
//! Sends messages to a single pre-configured chat through the Bot API
//! `sendMessage` method.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;

use super::{Notifier, error::NotificationError};
use crate::config::TelegramConfig;

/// Base URL of the Telegram Bot API.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Delivers messages to a fixed Telegram chat.
pub struct TelegramNotifier {
    /// Fully assembled `sendMessage` endpoint. Contains the bot token, so it
    /// must never be logged.
    url: String,
    /// The chat ID all messages are delivered to.
    chat_id: String,
    /// Whether to disable web page previews in delivered messages.
    disable_web_preview: bool,
    /// HTTP client with a bounded request timeout.
    client: Arc<ClientWithMiddleware>,
}

impl TelegramNotifier {
    /// Creates a new Telegram notifier instance.
    ///
    /// # Arguments
    /// * `config` - Telegram credentials and destination
    /// * `client` - HTTP client with a bounded request timeout
    ///
    /// # Returns
    /// * `Result<Self, NotificationError>` - Notifier instance if the config
    ///   is valid
    pub fn new(
        config: &TelegramConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        Self::with_api_base(TELEGRAM_API_BASE, config, client)
    }

    /// Creates a notifier against a custom API base URL. Used by tests to
    /// point the notifier at a local mock server.
    pub fn with_api_base(
        api_base: &str,
        config: &TelegramConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        if config.bot_token.is_empty() {
            return Err(NotificationError::ConfigError(
                "Telegram bot token cannot be empty.".to_string(),
            ));
        }
        if config.chat_id.is_empty() {
            return Err(NotificationError::ConfigError(
                "Telegram chat ID cannot be empty.".to_string(),
            ));
        }
        Ok(Self {
            url: format!("{}/bot{}/sendMessage", api_base, config.bot_token),
            chat_id: config.chat_id.clone(),
            disable_web_preview: config.disable_web_preview,
            client,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Posts the message to the configured chat. Relay messages are opaque
    /// free text, so no `parse_mode` is set.
    async fn notify(&self, message: &str) -> Result<(), NotificationError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "disable_web_page_preview": self.disable_web_preview,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::NotifyFailed(format!(
                "Telegram request failed with status: {status}"
            )));
        }

        tracing::debug!(chat_id = %self.chat_id, "Message delivered to Telegram.");
        Ok(())
    }
}
