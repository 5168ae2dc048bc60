//! Error types for the console core.

use thiserror::Error;

/// Console core error type.
///
/// Only top-level contract violations end up here. Missing nested fields in
/// event payloads are normalized to neutral values, and task input failures
/// are collected into [`ValidationErrors`](crate::tasks::ValidationErrors).
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The payload handed to a projection is not the expected shape at the
    /// top level (not an object, not an array where one is required).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A task parameter declaration breaks the schema contract.
    #[error("Invalid param {name}: {reason}")]
    InvalidParam {
        /// Programmatic name of the offending param.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No task with the requested name exists.
    #[error("Task not found: {0}")]
    UnknownTask(String),

    /// Two tasks in one catalog share a name.
    #[error("Duplicate task name found: {0}")]
    DuplicateTask(String),

    /// The configured display locale is not one the formatter knows.
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    pub(crate) fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }
}

/// Result type alias for console core operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
