//! Async reminder repository.
//!
//! Storage calls are blocking (SQLite), so each one runs on the tokio
//! blocking pool and the caller awaits its completion.

use crate::model::outcome::Outcome;
use crate::model::reminder::{Reminder, ReminderId};
use crate::store::{sort_by_id, ReminderStore, StoreResult};
use log::{error, warn};
use std::sync::Arc;
use tokio::task;

/// Single source of truth for "does this reminder exist".
pub struct ReminderRepository<S: ReminderStore + 'static> {
    store: Arc<S>,
}

impl<S: ReminderStore + 'static> Clone for ReminderRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReminderStore + 'static> ReminderRepository<S> {
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Builds a repository over a store that other owners keep a handle to.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Persists `reminder`, replacing any row with the same id.
    pub async fn save_reminder(&self, reminder: &Reminder) -> Outcome<()> {
        let reminder = reminder.clone();
        self.run("save_reminder", move |store| store.save(&reminder))
            .await
    }

    /// Returns all reminders sorted by id. An empty store is `Success([])`.
    pub async fn get_reminders(&self) -> Outcome<Vec<Reminder>> {
        self.run("get_reminders", |store| {
            let mut reminders = store.get_all()?;
            sort_by_id(&mut reminders);
            Ok(reminders)
        })
        .await
    }

    /// Looks up one reminder; an absent id yields `Error("Reminder not found!")`.
    pub async fn get_reminder(&self, id: &str) -> Outcome<Reminder> {
        let lookup_id = id.to_string();
        match self
            .run("get_reminder", move |store| store.get_by_id(&lookup_id))
            .await
        {
            Outcome::Success(Some(reminder)) => Outcome::Success(reminder),
            Outcome::Success(None) => Outcome::not_found(),
            Outcome::Error(message) => Outcome::Error(message),
        }
    }

    /// Removes one reminder. Removing an absent id succeeds.
    pub async fn delete_reminder(&self, id: &str) -> Outcome<()> {
        let delete_id = id.to_string();
        self.run("delete_reminder", move |store| store.delete(&delete_id))
            .await
    }

    /// Clears every reminder. Idempotent.
    pub async fn delete_all_reminders(&self) -> Outcome<()> {
        self.take_all_reminders().await.map(|_| ())
    }

    /// Clears every reminder and returns the removed ids sorted.
    ///
    /// The ids come from the same store call that removed the rows, so a
    /// reminder saved in between is never dropped without being reported.
    pub async fn take_all_reminders(&self) -> Outcome<Vec<ReminderId>> {
        self.run("take_all_reminders", |store| {
            let mut removed = store.delete_all()?;
            removed.sort();
            Ok(removed)
        })
        .await
    }

    async fn run<T, F>(&self, operation: &'static str, call: F) -> Outcome<T>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match task::spawn_blocking(move || call(store.as_ref())).await {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(err)) => {
                warn!("event=repo_call module=repo status=error operation={operation} error={err}");
                Outcome::Error(err.to_string())
            }
            Err(join_err) => {
                error!(
                    "event=repo_call module=repo status=error operation={operation} error_code=storage_task_failed error={join_err}"
                );
                Outcome::Error(format!("storage task failed: {join_err}"))
            }
        }
    }
}
