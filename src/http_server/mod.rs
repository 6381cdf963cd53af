//! HTTP server module.
//!
//! Owns the axum router, the shared request state, and the `/notify/`
//! orchestrator. All collaborators (notification log, notifier, throttle
//! policy) are constructed at startup and injected here; there is no global
//! state.

mod error;
mod notify;

use std::{collections::HashSet, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::Mutex;

pub use self::error::ApiError;
use crate::{
    config::AppConfig, notification::Notifier, persistence::traits::NotificationRepository,
    throttle::ThrottlePolicy,
};

/// Shared state for the HTTP server handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The append-only notification log.
    pub repo: Arc<dyn NotificationRepository>,

    /// The outbound delivery capability.
    pub notifier: Arc<dyn Notifier>,

    /// The cooldown decision engine.
    pub throttle: Arc<ThrottlePolicy>,

    /// The set of accepted caller tokens.
    pub auth_tokens: Arc<HashSet<String>>,

    /// Per-type locks serializing the check-then-act sequence, so two
    /// concurrent requests of the same type cannot both pass the cooldown.
    type_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ApiState {
    /// Creates the shared handler state from injected collaborators.
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        notifier: Arc<dyn Notifier>,
        throttle: Arc<ThrottlePolicy>,
        auth_tokens: HashSet<String>,
    ) -> Self {
        Self {
            repo,
            notifier,
            throttle,
            auth_tokens: Arc::new(auth_tokens),
            type_locks: Arc::new(DashMap::new()),
        }
    }

    /// Gets or creates the lock for a specific event type.
    pub(crate) fn type_lock(&self, event_type: &str) -> Arc<Mutex<()>> {
        self.type_locks
            .entry(event_type.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The number of event types a lock has been created for.
    #[cfg(test)]
    fn type_lock_count(&self) -> usize {
        self.type_locks.len()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router over the given state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/notify/", post(notify::notify))
        .with_state(state)
}

/// Runs the HTTP server based on the provided application configuration and
/// injected collaborators.
pub async fn run_server_from_config(
    config: Arc<AppConfig>,
    repo: Arc<dyn NotificationRepository>,
    notifier: Arc<dyn Notifier>,
    throttle: Arc<ThrottlePolicy>,
) {
    let addr: SocketAddr =
        config.server.listen_address.parse().expect("Invalid server.listen_address format");

    let auth_tokens: HashSet<String> = config.auth_tokens.iter().cloned().collect();
    let state = ApiState::new(repo, notifier, throttle, auth_tokens);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind address");
    tracing::info!(listen_address = %addr, "HTTP server listening.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

/// Completes when a shutdown signal is received, letting in-flight requests
/// finish before the caller cleans up resources.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
    }
}
