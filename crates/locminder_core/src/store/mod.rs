//! Durable reminder persistence.
//!
//! # Responsibility
//! - Define the key-value storage contract for reminder records.
//! - Keep SQL details behind the store boundary.
//!
//! # Invariants
//! - An unknown id is a normal `Ok(None)`, never an error.
//! - Saving an existing id replaces the whole row (last write wins).
//! - `get_all` returns exactly the surviving set, in no particular order.
//! - `delete_all` reports the ids it removed from the same critical section
//!   that removed them; a row saved concurrently is either in the result and
//!   gone, or absent from the result and still stored.

use crate::db::DbError;
use crate::model::reminder::{Reminder, ReminderId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryReminderStore;
pub use sqlite::SqliteReminderStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer failure. Converted to `Outcome::Error` by the repository.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A persisted row cannot be mapped back to a `Reminder`.
    InvalidData(String),
    /// The backing store cannot be reached (poisoned lock, injected fault).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted reminder data: {message}"),
            Self::Unavailable(message) => write!(f, "{message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Blocking key-value contract for reminder rows.
///
/// Implementations serialize their own writers; callers add no locking.
pub trait ReminderStore: Send + Sync {
    fn save(&self, reminder: &Reminder) -> StoreResult<()>;
    fn get_all(&self) -> StoreResult<Vec<Reminder>>;
    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>>;
    /// Removes one row. Removing an absent id is not an error.
    fn delete(&self, id: &str) -> StoreResult<()>;
    /// Removes every row and returns the removed ids, in no particular order.
    fn delete_all(&self) -> StoreResult<Vec<ReminderId>>;
}

impl<S: ReminderStore + ?Sized> ReminderStore for std::sync::Arc<S> {
    fn save(&self, reminder: &Reminder) -> StoreResult<()> {
        (**self).save(reminder)
    }

    fn get_all(&self) -> StoreResult<Vec<Reminder>> {
        (**self).get_all()
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>> {
        (**self).get_by_id(id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id)
    }

    fn delete_all(&self) -> StoreResult<Vec<ReminderId>> {
        (**self).delete_all()
    }
}

/// Sorts reminders by id for deterministic listing.
pub(crate) fn sort_by_id(reminders: &mut [Reminder]) {
    reminders.sort_by(|left, right| left.id.cmp(&right.id));
}
