//! Error types for the state log.
//!
//! The map and the core state-log operations are total; these errors only
//! surface from the non-blocking notification path and snapshot encoding.

use thiserror::Error;

/// Main error type for fallible state-log operations.
#[derive(Debug, Error)]
pub enum StatesError {
    #[error("Notification buffer full, change for {subsystem} was logged but not delivered")]
    NotificationBufferFull { subsystem: String },

    #[error("Notification sender busy, change for {subsystem} was logged but not delivered")]
    NotificationsBusy { subsystem: String },

    #[error("Notification channel disconnected")]
    NotificationsDisconnected,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for StatesError {
    fn from(e: serde_json::Error) -> Self {
        StatesError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StatesError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StatesError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StatesError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StatesError::Deserialization(e.to_string())
    }
}

/// Result type for state-log operations.
pub type Result<T> = std::result::Result<T, StatesError>;
