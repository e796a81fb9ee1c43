//! SQLite-backed reminder store.
//!
//! # Invariants
//! - One connection, guarded by a mutex: writers are serialized and each
//!   save is a single `INSERT OR REPLACE` statement, so overlapping saves for
//!   the same id never interleave field writes.
//! - Read paths reject rows whose id is empty instead of masking them.

use super::{ReminderStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::reminder::{Reminder, ReminderId};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    location_name,
    latitude,
    longitude
FROM reminders";

pub struct SqliteReminderStore {
    conn: Mutex<Connection>,
}

impl SqliteReminderStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the database file at `path`, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            error!("event=store_lock module=store status=error error_code=lock_poisoned");
            StoreError::Unavailable("reminder database connection is poisoned".to_string())
        })
    }
}

impl ReminderStore for SqliteReminderStore {
    fn save(&self, reminder: &Reminder) -> StoreResult<()> {
        if reminder.id.trim().is_empty() {
            return Err(StoreError::InvalidData(
                "reminder id must not be empty".to_string(),
            ));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO reminders (
                id,
                title,
                description,
                location_name,
                latitude,
                longitude
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                reminder.id.as_str(),
                reminder.title.as_deref(),
                reminder.description.as_deref(),
                reminder.location_name.as_deref(),
                reminder.latitude,
                reminder.longitude,
            ],
        )?;
        debug!("event=reminder_save module=store status=ok reminder_id={}", reminder.id);
        Ok(())
    }

    fn get_all(&self) -> StoreResult<Vec<Reminder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(REMINDER_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<Reminder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_reminder_row(row)))
            .optional()?;
        row.transpose()
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM reminders WHERE id = ?1;", [id])?;
        debug!("event=reminder_delete module=store status=ok reminder_id={id} removed={removed}");
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<Vec<ReminderId>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("DELETE FROM reminders RETURNING id;")?;
        let removed = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "event=reminder_delete_all module=store status=ok removed={}",
            removed.len()
        );
        Ok(removed)
    }
}

fn parse_reminder_row(row: &Row<'_>) -> StoreResult<Reminder> {
    let id: String = row.get("id")?;
    if id.trim().is_empty() {
        return Err(StoreError::InvalidData(
            "empty id in reminders.id".to_string(),
        ));
    }

    Ok(Reminder {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        location_name: row.get("location_name")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
    })
}

#[cfg(test)]
mod tests {
    use super::SqliteReminderStore;
    use crate::model::reminder::Reminder;
    use crate::store::{ReminderStore, StoreError};

    #[test]
    fn save_rejects_empty_id() {
        let store = SqliteReminderStore::open_in_memory().unwrap();
        let err = store.save(&Reminder::with_id("  ")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn delete_all_returns_removed_ids_and_empties_table() {
        let store = SqliteReminderStore::open_in_memory().unwrap();
        for id in ["b", "a"] {
            store.save(&Reminder::with_id(id).title("t")).unwrap();
        }

        let mut removed = store.delete_all().unwrap();
        removed.sort();

        assert_eq!(removed, vec!["a", "b"]);
        assert!(store.get_all().unwrap().is_empty());
        assert!(store.delete_all().unwrap().is_empty());
    }

    #[test]
    fn absent_optional_columns_roundtrip_as_none() {
        let store = SqliteReminderStore::open_in_memory().unwrap();
        store.save(&Reminder::with_id("bare")).unwrap();

        let loaded = store.get_by_id("bare").unwrap().unwrap();
        assert_eq!(loaded, Reminder::with_id("bare"));
    }
}
