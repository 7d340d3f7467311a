//! Persistent record of downloaded image URLs.
//!
//! Backed by a single SQLite table with a UNIQUE constraint on the URL, so
//! uniqueness is enforced by the storage engine rather than by a prior lookup.

use std::path::Path;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Result, WikiwallError};

/// Database file name inside the data directory.
pub const DB_FILENAME: &str = "wikiwall.db";

/// Table holding one row per downloaded URL.
pub const TABLE_NAME: &str = "downloads";

/// Handle to the download history.
///
/// The underlying connection is released when the handle is dropped, so every
/// exit path of the enclosing scope closes the database.
pub struct SeenStore {
    conn: Connection,
}

impl SeenStore {
    /// Open (or create) the store at `location`, creating the schema if absent.
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        let location = location.as_ref();
        if let Some(parent) = location.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(location)?;
        let store = Self::init(conn)?;
        info!(path = %location.display(), records = store.len()?, "Opened download history");
        Ok(store)
    }

    /// Open a throwaway store that lives only as long as the handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                    id INTEGER PRIMARY KEY,
                    url TEXT NOT NULL UNIQUE
                )"
            ),
            [],
        )?;
        Ok(Self { conn })
    }

    /// Whether `url` has been recorded before.
    pub fn contains(&self, url: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT id FROM {TABLE_NAME} WHERE url = ?1"),
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Record `url`. Fails with [`WikiwallError::Duplicate`] if it is already present.
    pub fn add(&self, url: &str) -> Result<()> {
        let inserted = self.conn.execute(
            &format!("INSERT INTO {TABLE_NAME} (url) VALUES (?1)"),
            params![url],
        );

        match inserted {
            Ok(_) => {
                debug!(url, "Recorded download");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(WikiwallError::Duplicate(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of recorded URLs.
    pub fn len(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Close the database now, reporting any error the drop path would hide.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| WikiwallError::Storage(e))
    }
}
