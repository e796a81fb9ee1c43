//! Uniform operation outcome used at the repository boundary.
//!
//! Storage faults and lookup misses are converted to `Outcome::Error` with a
//! human-readable message before they leave the repository, so callers never
//! match on driver-specific error types.

use serde::{Deserialize, Serialize};

/// Exact message returned when a reminder id is absent.
///
/// UI messaging and stale-geofence cleanup key off this literal.
pub const REMINDER_NOT_FOUND: &str = "Reminder not found!";

/// Two-variant operation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    Error(String),
}

impl<T> Outcome<T> {
    pub fn not_found() -> Self {
        Self::Error(REMINDER_NOT_FOUND.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns whether this is the lookup-miss error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Error(message) if message == REMINDER_NOT_FOUND)
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error(message) => Some(message.as_str()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Error(message) => Outcome::Error(message),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(err.to_string()),
        }
    }
}
