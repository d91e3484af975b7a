//! SQLite-backed MessageStore

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::error::StoreError;
use super::traits::MessageStore;
use crate::message::{ChatMessage, StoredMessage};

/// SQL for each migration version
const MIGRATIONS: &[(&str, &str)] = &[(
    "v001_initial",
    include_str!("migrations/v001_initial.sql"),
)];

/// Durable MessageStore backed by SQLite
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<StoredMessage, rusqlite::Error> {
        let millis: i64 = row.get(4)?;
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, millis))?;
        Ok(StoredMessage {
            id: row.get(0)?,
            message: ChatMessage {
                channel: row.get(1)?,
                username: row.get(2)?,
                text: row.get(3)?,
                timestamp,
            },
        })
    }
}

/// Run all pending migrations, tracked via `user_version`.
fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let current: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    for (idx, (name, sql)) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as i32;
        if version > current {
            tracing::info!("Running migration {}: {}", version, name);
            conn.execute_batch(sql)
                .map_err(|e| StoreError::Migration(format!("{}: {}", name, e)))?;
            conn.pragma_update(None, "user_version", version)?;
        }
    }

    Ok(())
}

impl MessageStore for SqliteStore {
    fn append(&self, message: &ChatMessage) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO messages (channel, username, message, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                message.channel,
                message.username,
                message.text,
                message.timestamp.timestamp_millis(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query_range(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let records = if let Some(to) = to {
            let mut stmt = conn.prepare(
                "SELECT id, channel, username, message, timestamp
                 FROM messages WHERE timestamp >= ?1 AND timestamp <= ?2
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(
                rusqlite::params![from.timestamp_millis(), to.timestamp_millis()],
                |row| Self::row_to_record(row),
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, channel, username, message, timestamp
                 FROM messages WHERE timestamp >= ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(rusqlite::params![from.timestamp_millis()], |row| {
                Self::row_to_record(row)
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(records)
    }
}
