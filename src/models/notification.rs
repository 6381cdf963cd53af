//! Data models for notification events and the inbound request wire format.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{deserialize_duration_from_seconds, serialize_duration_to_seconds};

/// A single accepted notification event, as persisted in the append-only log.
///
/// Rows are immutable once stored; the newest row per `event_type` is what the
/// throttle policy compares against.
#[derive(Debug, Clone, sqlx::FromRow, PartialEq, Eq)]
pub struct Notification {
    /// Storage-assigned identifier, monotonically increasing.
    pub id: i64,

    /// Free-form event category (e.g. "disk-full"). Never validated against
    /// a fixed set.
    pub event_type: String,

    /// The instant the event was accepted, assigned by the relay at receipt.
    pub time: DateTime<Utc>,

    /// Free-text payload. May be empty.
    pub message: String,
}

/// The inbound request body for `POST /notify/`.
///
/// The schema is strict: any field beyond `type`, `message` and `token` is a
/// client error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NotifyRequest {
    /// Event category the cooldown is keyed on.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Message to relay to the chat destination.
    pub message: String,

    /// Caller credential, checked against the configured token set.
    pub token: String,
}

/// A configured cooldown for one event type: the minimum time that must pass
/// after an accepted event before another of the same type is allowed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CooldownRule {
    /// The event type this rule applies to.
    #[serde(rename = "type")]
    pub event_type: String,

    /// The cooldown window in seconds.
    #[serde(
        rename = "cooldown_secs",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub cooldown: Duration,
}
