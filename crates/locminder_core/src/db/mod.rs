//! Reminder database: one `reminders` table keyed by reminder id.
//!
//! | column          | type | null |
//! |-----------------|------|------|
//! | `id`            | TEXT | primary key, never null or blank |
//! | `title`         | TEXT | yes |
//! | `description`   | TEXT | yes |
//! | `location_name` | TEXT | yes |
//! | `latitude`      | REAL | yes |
//! | `longitude`     | REAL | yes |
//!
//! Geofence registrations are not stored; they are rebuilt from these rows.
//! The schema generation lives in `PRAGMA user_version` (currently 1) and
//! connections handed out by [`open_db`] are already migrated to it. A file
//! stamped by a newer build is refused rather than rewritten.

use rusqlite::Connection;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of every migration this build knows.
    SchemaTooNew { found: u32, supported: u32 },
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "reminder database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "reminder database schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

/// Reads the schema generation stamped on `conn`; 0 for a fresh file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
