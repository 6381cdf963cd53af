//! End-to-end tests for the `/notify/` endpoint: a real server over a real
//! SQLite file, with delivery replaced by an in-process recording notifier.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use herald::{
    config::{AppConfig, ServerConfig, TelegramConfig},
    http_server,
    models::CooldownRule,
    notification::{Notifier, error::NotificationError},
    persistence::{SqliteNotificationRepository, traits::NotificationRepository},
    throttle::{CooldownTable, ThrottlePolicy},
};
use reqwest::{Client, StatusCode};
use serde_json::json;
use tokio::{sync::Mutex, task};

/// A notifier that records delivered messages instead of calling Telegram.
#[derive(Default)]
struct RecordingNotifier {
    delivered: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    async fn delivered(&self) -> Vec<String> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotificationError> {
        self.delivered.lock().await.push(message.to_string());
        Ok(())
    }
}

/// A notifier whose every delivery attempt fails.
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _message: &str) -> Result<(), NotificationError> {
        Err(NotificationError::NotifyFailed("delivery endpoint unreachable".to_string()))
    }
}

struct TestServer {
    address: SocketAddr,
    client: Client,
    repo: Arc<SqliteNotificationRepository>,
    /// Present only when the server was built with `new`; `with_notifier`
    /// servers have no recorder to observe.
    notifier: Option<Arc<RecordingNotifier>>,
    _db_dir: tempfile::TempDir,
}

impl TestServer {
    /// Spawns the app server with the given cooldown rules and token set,
    /// recording deliveries instead of calling Telegram.
    async fn new(cooldowns: Vec<CooldownRule>, auth_tokens: &[&str]) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut server = Self::with_notifier(cooldowns, auth_tokens, notifier.clone()).await;
        server.notifier = Some(notifier);
        server
    }

    /// The messages delivered so far, for servers built with `new`.
    async fn delivered(&self) -> Vec<String> {
        self.notifier
            .as_ref()
            .expect("server was not built with a recording notifier")
            .delivered()
            .await
    }

    /// Spawns the app server with an arbitrary notifier implementation; the
    /// result cannot observe deliveries. Use `new` when the test needs to.
    async fn with_notifier(
        cooldowns: Vec<CooldownRule>,
        auth_tokens: &[&str],
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get address");
        drop(listener); // Release port for the app to use

        let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let database_url =
            format!("sqlite://{}", db_dir.path().join("herald.sqlite3").display());

        let repo = Arc::new(
            SqliteNotificationRepository::new(&database_url)
                .await
                .expect("Failed to create repo"),
        );
        repo.run_migrations().await.expect("Failed to run migrations");

        let config = Arc::new(AppConfig {
            database_url,
            auth_tokens: auth_tokens.iter().map(|t| t.to_string()).collect(),
            telegram: TelegramConfig::default(),
            cooldowns: cooldowns.clone(),
            server: ServerConfig { listen_address: addr.to_string() },
        });

        let throttle = Arc::new(ThrottlePolicy::new(
            CooldownTable::new(cooldowns).expect("Invalid cooldown rules"),
            repo.clone() as Arc<dyn NotificationRepository>,
        ));

        let server_repo = repo.clone() as Arc<dyn NotificationRepository>;
        task::spawn(async move {
            http_server::run_server_from_config(config, server_repo, notifier, throttle).await;
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(500)).await;

        Self {
            address: addr,
            client: Client::new(),
            repo,
            notifier: None,
            _db_dir: db_dir,
        }
    }

    fn notify_url(&self) -> String {
        format!("http://{}/notify/", self.address)
    }

    async fn post_notify(&self, body: serde_json::Value) -> reqwest::Response {
        self.client.post(self.notify_url()).json(&body).send().await.expect("Request failed")
    }
}

fn disk_full_rule(secs: u64) -> CooldownRule {
    CooldownRule { event_type: "disk-full".to_string(), cooldown: Duration::from_secs(secs) }
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new(vec![], &["valid1"]).await;

    let response = server
        .client
        .get(format!("http://{}/health", server.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_first_event_is_notified_and_stored() {
    let server = TestServer::new(vec![disk_full_rule(60)], &["valid1", "valid2"]).await;

    let response = server
        .post_notify(json!({
            "type": "disk-full",
            "message": "root is at 97%",
            "token": "valid1",
        }))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "notified");

    let stored = server.repo.last_of_type("disk-full").await.unwrap().unwrap();
    assert_eq!(stored.message, "root is at 97%");
    assert_eq!(server.delivered().await, vec!["root is at 97%".to_string()]);
}

#[tokio::test]
async fn test_repeat_within_cooldown_is_suppressed() {
    let server = TestServer::new(vec![disk_full_rule(60)], &["valid1"]).await;

    let first = server
        .post_notify(json!({"type": "disk-full", "message": "first", "token": "valid1"}))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = server
        .post_notify(json!({"type": "disk-full", "message": "second", "token": "valid1"}))
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["status"], "notification timeout");

    // The suppressed event was neither stored nor delivered.
    let stored = server.repo.last_of_type("disk-full").await.unwrap().unwrap();
    assert_eq!(stored.message, "first");
    assert_eq!(server.delivered().await.len(), 1);
}

#[tokio::test]
async fn test_event_after_cooldown_is_allowed_again() {
    let server = TestServer::new(vec![disk_full_rule(1)], &["valid1"]).await;

    let first = server
        .post_notify(json!({"type": "disk-full", "message": "first", "token": "valid1"}))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let second = server
        .post_notify(json!({"type": "disk-full", "message": "second", "token": "valid1"}))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);

    // The log now reflects the later event.
    let stored = server.repo.last_of_type("disk-full").await.unwrap().unwrap();
    assert_eq!(stored.message, "second");
    assert_eq!(server.delivered().await.len(), 2);
}

#[tokio::test]
async fn test_type_without_rule_is_never_throttled() {
    let server = TestServer::new(vec![disk_full_rule(60)], &["valid1"]).await;

    for i in 0..3 {
        let response = server
            .post_notify(json!({
                "type": "unthrottled",
                "message": format!("event {i}"),
                "token": "valid1",
            }))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    assert_eq!(server.delivered().await.len(), 3);
}

#[tokio::test]
async fn test_invalid_token_is_forbidden_and_leaves_no_trace() {
    let server = TestServer::new(vec![disk_full_rule(60)], &["valid1", "valid2"]).await;

    let response = server
        .post_notify(json!({"type": "disk-full", "message": "m", "token": "abc"}))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.text().await.unwrap(), "Invalid token");

    // No row was written and nothing was delivered.
    assert!(server.repo.last_of_type("disk-full").await.unwrap().is_none());
    assert!(server.delivered().await.is_empty());

    // Auth failures must not consume the cooldown window: a valid request
    // right after still passes.
    let response = server
        .post_notify(json!({"type": "disk-full", "message": "m", "token": "valid1"}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_field_is_bad_request_and_leaves_no_trace() {
    let server = TestServer::new(vec![], &["valid1"]).await;

    let response = server
        .post_notify(json!({
            "type": "disk-full",
            "message": "m",
            "token": "valid1",
            "extra": "x",
        }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.repo.last_of_type("disk-full").await.unwrap().is_none());
    assert!(server.delivered().await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = TestServer::new(vec![], &["valid1"]).await;

    let response = server
        .client
        .post(server.notify_url())
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivery_failure_still_records_event() {
    let server =
        TestServer::with_notifier(vec![disk_full_rule(60)], &["valid1"], Arc::new(FailingNotifier))
            .await;

    let response = server
        .post_notify(json!({"type": "disk-full", "message": "m", "token": "valid1"}))
        .await;

    // Caller-visible success is decoupled from downstream delivery.
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = server.repo.last_of_type("disk-full").await.unwrap().unwrap();
    assert_eq!(stored.message, "m");

    // And the failed delivery consumed the cooldown window.
    let repeat = server
        .post_notify(json!({"type": "disk-full", "message": "again", "token": "valid1"}))
        .await;
    assert_eq!(repeat.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_concurrent_same_type_requests_only_one_allowed() {
    let server = TestServer::new(vec![disk_full_rule(60)], &["valid1"]).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = server.client.clone();
        let url = server.notify_url();
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({"type": "disk-full", "message": format!("event {i}"), "token": "valid1"}))
                .send()
                .await
                .expect("Request failed")
                .status()
        }));
    }

    let mut created = 0;
    let mut suppressed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => suppressed += 1,
            other => panic!("Unexpected status: {other}"),
        }
    }

    // The per-type lock serializes check-then-act: exactly one winner.
    assert_eq!(created, 1);
    assert_eq!(suppressed, 7);
    assert_eq!(server.delivered().await.len(), 1);
}
