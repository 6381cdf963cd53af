//! Handler for the `POST /notify/` endpoint.
//!
//! Each request moves through a fixed sequence: parse, authenticate, throttle
//! check, dispatch, persist, respond. Side effects are strictly ordered and
//! no step is re-entered.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;

use super::{ApiState, error::ApiError};
use crate::models::NotifyRequest;

/// Accepts a notification event, applies the cooldown, and relays it.
///
/// Authentication happens before any throttle state is read, so rejected
/// callers cannot observe or affect cooldown windows. For types with a
/// cooldown rule, the per-type lock is held from the cooldown check through
/// the append: without it, two concurrent requests of the same type could
/// both read "no recent event" and both pass.
pub async fn notify(
    State(state): State<ApiState>,
    payload: Result<Json<NotifyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    // PARSE: strict schema, unknown fields rejected by the model.
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    // AUTHENTICATE
    if !state.auth_tokens.contains(&request.token) {
        tracing::warn!(event_type = %request.event_type, "Rejected notify request with invalid token.");
        return Err(ApiError::InvalidToken);
    }

    // Only ruled types read cooldown state, so only they take the lock; the
    // lock map stays bounded by the configured rules even though event types
    // are arbitrary caller-chosen strings.
    let lock =
        state.throttle.has_rule(&request.event_type).then(|| state.type_lock(&request.event_type));
    let _guard = match &lock {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };
    let now = Utc::now();

    // THROTTLE CHECK
    if !state.throttle.is_allowed(&request.event_type, now).await? {
        tracing::info!(event_type = %request.event_type, "Notification suppressed by cooldown.");
        return Ok((StatusCode::CONFLICT, Json(json!({ "status": "notification timeout" })))
            .into_response());
    }

    // DISPATCH: a delivery failure is logged but never alters the outcome;
    // the contract is "we tried and we remember the event happened".
    if let Err(e) = state.notifier.notify(&request.message).await {
        tracing::error!(
            event_type = %request.event_type,
            error = %e,
            "Failed to deliver notification."
        );
    }

    // PERSIST: unconditional on delivery outcome.
    let id = state.repo.append(&request.event_type, now, &request.message).await?;
    tracing::info!(event_type = %request.event_type, id, "Notification recorded.");

    Ok((StatusCode::CREATED, Json(json!({ "status": "notified" }))).into_response())
}
