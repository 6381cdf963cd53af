use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::{ServerConfig, deserialize_duration_from_seconds};
use crate::models::CooldownRule;

/// Provides the default value for request_timeout_secs.
fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Credentials and destination for Telegram delivery.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    /// The Telegram bot token.
    pub bot_token: String,

    /// The chat ID all notifications are delivered to.
    pub chat_id: String,

    /// Whether to disable web page previews in delivered messages.
    #[serde(default)]
    pub disable_web_preview: bool,

    /// The maximum time to wait for a single delivery attempt.
    #[serde(
        rename = "request_timeout_secs",
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_request_timeout"
    )]
    pub request_timeout: Duration,
}

/// Application configuration for Herald.
#[derive(Debug, Deserialize, Clone)]
#[cfg_attr(test, derive(Default))]
pub struct AppConfig {
    /// Database URL for the SQLite notification log.
    pub database_url: String,

    /// The set of tokens accepted from callers. Loaded once, immutable.
    pub auth_tokens: Vec<String>,

    /// Telegram delivery configuration.
    pub telegram: TelegramConfig,

    /// Per-type cooldown rules. Types without a rule are never throttled.
    #[serde(default)]
    pub cooldowns: Vec<CooldownRule>,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading from the configuration directory.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("HERALD").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn database_url(mut self, url: &str) -> Self {
        self.config.database_url = url.to_string();
        self
    }

    pub fn auth_tokens(mut self, tokens: &[&str]) -> Self {
        self.config.auth_tokens = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn telegram(mut self, telegram: TelegramConfig) -> Self {
        self.config.telegram = telegram;
        self
    }

    pub fn cooldowns(mut self, cooldowns: Vec<CooldownRule>) -> Self {
        self.config.cooldowns = cooldowns;
        self
    }

    pub fn listen_address(mut self, address: &str) -> Self {
        self.config.server.listen_address = address.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
