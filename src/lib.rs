#![warn(missing_docs)]
//! Herald is a small notification relay: it accepts authenticated HTTP events,
//! debounces them with a per-type cooldown backed by an append-only SQLite log,
//! and forwards allowed events to a fixed Telegram chat.

pub mod config;
pub mod http_client;
pub mod http_server;
pub mod models;
pub mod notification;
pub mod persistence;
pub mod throttle;
