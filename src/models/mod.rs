//! This module contains the data models for the Herald application.

pub mod notification;

pub use notification::{CooldownRule, Notification, NotifyRequest};
