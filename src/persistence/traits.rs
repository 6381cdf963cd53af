//! The storage interface the relay depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use super::error::PersistenceError;
use crate::models::Notification;

/// The append-only notification log.
///
/// The relay only ever needs two capabilities from storage: record an accepted
/// event, and look up the most recent event of a type for the cooldown
/// decision. A completed `append` must be visible to every subsequent
/// `last_of_type` call within the process.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persists a new notification event and returns its assigned id. The
    /// write is durable before this returns.
    async fn append(
        &self,
        event_type: &str,
        time: DateTime<Utc>,
        message: &str,
    ) -> Result<i64, PersistenceError>;

    /// Returns the event of the given type with the latest timestamp, or
    /// `None` if no event of that type was ever stored. Timestamp ties are
    /// broken by insertion order.
    async fn last_of_type(&self, event_type: &str)
    -> Result<Option<Notification>, PersistenceError>;
}
