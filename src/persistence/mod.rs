//! This module contains the notification log persistence for Herald.

pub mod error;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteNotificationRepository;
