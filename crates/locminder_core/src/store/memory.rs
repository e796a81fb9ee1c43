//! In-process reminder store.
//!
//! Backs hosts that run without durable storage and serves as the fake data
//! source in tests: `set_return_error(true)` makes every call fail the way an
//! unreachable database would.

use super::{ReminderStore, StoreError, StoreResult};
use crate::model::reminder::{Reminder, ReminderId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Message returned while failure mode is enabled.
pub const INJECTED_FAILURE_MESSAGE: &str = "Test exception";

#[derive(Debug, Default)]
pub struct MemoryReminderStore {
    rows: Mutex<HashMap<ReminderId, Reminder>>,
    return_error: AtomicBool,
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing reminders.
    pub fn with_reminders(reminders: impl IntoIterator<Item = Reminder>) -> Self {
        let rows = reminders
            .into_iter()
            .map(|reminder| (reminder.id.clone(), reminder))
            .collect();
        Self {
            rows: Mutex::new(rows),
            return_error: AtomicBool::new(false),
        }
    }

    /// Toggles failure mode for every subsequent call.
    pub fn set_return_error(&self, value: bool) {
        self.return_error.store(value, Ordering::SeqCst);
    }

    fn rows(&self) -> StoreResult<MutexGuard<'_, HashMap<ReminderId, Reminder>>> {
        if self.return_error.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                INJECTED_FAILURE_MESSAGE.to_string(),
            ));
        }
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable("reminder map is poisoned".to_string()))
    }
}

impl ReminderStore for MemoryReminderStore {
    fn save(&self, reminder: &Reminder) -> StoreResult<()> {
        self.rows()?.insert(reminder.id.clone(), reminder.clone());
        Ok(())
    }

    fn get_all(&self) -> StoreResult<Vec<Reminder>> {
        Ok(self.rows()?.values().cloned().collect())
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>> {
        Ok(self.rows()?.get(id).cloned())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        self.rows()?.remove(id);
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<Vec<ReminderId>> {
        Ok(self.rows()?.drain().map(|(id, _)| id).collect())
    }
}
