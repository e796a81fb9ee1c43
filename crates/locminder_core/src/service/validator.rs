//! Reminder completeness checks.
//!
//! # Responsibility
//! - Decide whether a candidate reminder may be activated.
//! - Report which field category is missing so callers can pick one
//!   user-visible message.
//!
//! # Invariants
//! - Pure and stateless: no I/O, no logging, no message text selection.
//! - `description` and `location_name` never block validation.

use crate::model::reminder::Reminder;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field category that blocks activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    MissingTitle,
    MissingLocation,
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "reminder title is missing"),
            Self::MissingLocation => write!(f, "reminder location is missing"),
        }
    }
}

impl Error for ValidationFailure {}

/// Returns whether `candidate` has a non-empty title and both coordinates
/// as finite numbers.
pub fn validate(candidate: &Reminder) -> bool {
    first_missing_field(candidate).is_none()
}

/// Returns the first blocking field category, title before location.
pub fn first_missing_field(candidate: &Reminder) -> Option<ValidationFailure> {
    let has_title = candidate
        .title
        .as_deref()
        .is_some_and(|title| !title.trim().is_empty());
    if !has_title {
        return Some(ValidationFailure::MissingTitle);
    }
    if candidate.coordinates().is_none() {
        return Some(ValidationFailure::MissingLocation);
    }
    None
}

/// `Result` form of [`validate`] for `?`-style callers.
pub fn ensure_activatable(candidate: &Reminder) -> Result<(), ValidationFailure> {
    match first_missing_field(candidate) {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}
