//! The cooldown decision engine.
//!
//! A `CooldownTable` maps event types to their configured cooldown windows,
//! and `ThrottlePolicy` combines it with the notification log to decide
//! allow/suppress for an incoming event. The decision is pure given the clock
//! and the log content; callers are responsible for holding the per-type lock
//! across the full check-then-act sequence.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    models::CooldownRule,
    persistence::{error::PersistenceError, traits::NotificationRepository},
};

/// Errors that can occur when building the cooldown table.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// Two rules were configured for the same event type.
    #[error("Duplicate cooldown rule for event type '{0}'")]
    DuplicateRule(String),
}

/// The configured cooldown windows, keyed by event type.
///
/// Built once at startup and read-only afterwards. Duplicate types in the
/// configuration are rejected rather than resolved by iteration order.
#[derive(Debug, Clone, Default)]
pub struct CooldownTable {
    rules: HashMap<String, Duration>,
}

impl CooldownTable {
    /// Builds the table from configured rules, rejecting duplicate types.
    pub fn new(rules: Vec<CooldownRule>) -> Result<Self, ThrottleError> {
        let mut table = HashMap::with_capacity(rules.len());
        for rule in rules {
            if table.insert(rule.event_type.clone(), rule.cooldown).is_some() {
                return Err(ThrottleError::DuplicateRule(rule.event_type));
            }
        }
        Ok(Self { rules: table })
    }

    /// Returns the cooldown for an event type, or `None` if the type is
    /// unthrottled.
    pub fn cooldown(&self, event_type: &str) -> Option<Duration> {
        self.rules.get(event_type).copied()
    }
}

/// Decides whether an incoming event is allowed or suppressed.
pub struct ThrottlePolicy {
    /// The per-type cooldown windows.
    table: CooldownTable,

    /// The notification log the prior-event lookup goes through.
    repo: Arc<dyn NotificationRepository>,
}

impl ThrottlePolicy {
    /// Creates a new ThrottlePolicy over the given cooldown table and log.
    pub fn new(table: CooldownTable, repo: Arc<dyn NotificationRepository>) -> Self {
        Self { table, repo }
    }

    /// Returns whether the event type carries a cooldown rule at all. Types
    /// without a rule never consult the log, so callers need no per-type
    /// serialization for them.
    pub fn has_rule(&self, event_type: &str) -> bool {
        self.table.cooldown(event_type).is_some()
    }

    /// Returns whether an event of `event_type` arriving at `now` is allowed.
    ///
    /// Types without a rule and first occurrences of a type always pass.
    /// Otherwise the event is allowed iff strictly more than the configured
    /// cooldown has elapsed since the last accepted event of the type; an
    /// event arriving exactly at the boundary is still suppressed.
    pub async fn is_allowed(
        &self,
        event_type: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, PersistenceError> {
        let Some(cooldown) = self.table.cooldown(event_type) else {
            return Ok(true);
        };

        let Some(prior) = self.repo.last_of_type(event_type).await? else {
            return Ok(true);
        };

        let elapsed = now.signed_duration_since(prior.time);
        let allowed = elapsed
            .to_std()
            .map(|elapsed| elapsed > cooldown)
            // A prior event in the future means no positive time has elapsed.
            .unwrap_or(false);

        if !allowed {
            tracing::debug!(
                event_type,
                elapsed_ms = elapsed.num_milliseconds(),
                cooldown_secs = cooldown.as_secs(),
                "Event suppressed by cooldown."
            );
        }
        Ok(allowed)
    }
}
