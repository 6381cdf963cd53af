//! This module provides a concrete implementation of the NotificationRepository using SQLite.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};

use super::{error::PersistenceError, traits::NotificationRepository};
use crate::models::Notification;

/// SQL query constants for notification log operations
mod notification_sql {
    /// Insert a new notification event
    pub const INSERT_NOTIFICATION: &str =
        "INSERT INTO notifications (event_type, time, message) VALUES (?, ?, ?)";

    /// Select the most recent notification for an event type. Timestamp ties
    /// are broken by insertion order (id).
    pub const SELECT_LAST_OF_TYPE: &str = "SELECT id, event_type, time, message FROM notifications WHERE event_type = ? ORDER BY time DESC, id DESC LIMIT 1";
}

/// A concrete implementation of the NotificationRepository using SQLite.
pub struct SqliteNotificationRepository {
    /// The SQLite connection pool used for database operations.
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    /// Creates a new instance of SqliteNotificationRepository with the provided database URL.
    /// This will create the database file if it does not exist.
    #[tracing::instrument(level = "info")]
    pub async fn new(database_url: &str) -> Result<Self, PersistenceError> {
        tracing::debug!(database_url, "Attempting to connect to SQLite database.");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(PersistenceError::OperationFailed)?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        tracing::info!(database_url, "Successfully connected to SQLite database.");
        Ok(Self { pool })
    }

    /// Runs database migrations.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        tracing::debug!("Running database migrations.");
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run database migrations.");
            e
        })?;
        tracing::info!("Database migrations completed successfully.");
        Ok(())
    }

    /// Closes the connection pool gracefully.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn close(&self) {
        tracing::debug!("Closing SQLite connection pool.");
        self.pool.close().await;
        tracing::info!("SQLite connection pool closed successfully.");
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    /// Appends a notification event to the log and returns its assigned id.
    #[tracing::instrument(skip(self, message), level = "debug")]
    async fn append(
        &self,
        event_type: &str,
        time: DateTime<Utc>,
        message: &str,
    ) -> Result<i64, PersistenceError> {
        let result = sqlx::query(notification_sql::INSERT_NOTIFICATION)
            .bind(event_type)
            .bind(time)
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, event_type, "Failed to append notification.");
                e
            })?;

        let id = result.last_insert_rowid();
        tracing::debug!(event_type, id, "Notification appended.");
        Ok(id)
    }

    /// Retrieves the most recent notification of the given type, if any.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn last_of_type(
        &self,
        event_type: &str,
    ) -> Result<Option<Notification>, PersistenceError> {
        let notification =
            sqlx::query_as::<_, Notification>(notification_sql::SELECT_LAST_OF_TYPE)
                .bind(event_type)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, event_type, "Failed to query last notification.");
                    e
                })?;

        match &notification {
            Some(found) => {
                tracing::debug!(event_type, id = found.id, time = %found.time, "Last notification found.")
            }
            None => tracing::debug!(event_type, "No prior notification of this type."),
        }
        Ok(notification)
    }
}
