//! # Notification delivery
//!
//! This module owns the outbound side of the relay: the `Notifier` trait is
//! the single capability the orchestrator needs ("deliver this message"), and
//! `TelegramNotifier` is its production implementation over the Telegram Bot
//! API.
//!
//! Delivery is deliberately fire-and-forget from the caller's perspective:
//! one attempt, bounded by the client timeout, no retry and no queueing. A
//! failed delivery is logged by the orchestrator and never changes the
//! caller-visible outcome.

pub mod error;
mod telegram;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use self::telegram::TelegramNotifier;
use self::error::NotificationError;

/// The outbound delivery capability.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a message to the fixed chat destination. Exactly one attempt.
    async fn notify(&self, message: &str) -> Result<(), NotificationError>;
}
