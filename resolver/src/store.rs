//! Persistent warm tier: one SQLite row per (repo, blob sha, kind, name).
//!
//! Rows are written with `INSERT OR REPLACE` and never updated in place or
//! deleted, so several resolvers may share one database file.

use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::ResolverError;
use crate::models::{CacheKey, SymbolRecord};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sym(
    repo TEXT NOT NULL,
    sha TEXT NOT NULL,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    path TEXT NOT NULL,
    line INTEGER NOT NULL,
    code TEXT NOT NULL,
    PRIMARY KEY(repo, sha, kind, name)
)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WarmStore {
    conn: Mutex<Connection>,
}

impl WarmStore {
    pub fn open(path: &Path) -> Result<Self, ResolverError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::with_connection(Connection::open(path)?)?)
    }

    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, key: &CacheKey) -> rusqlite::Result<Option<SymbolRecord>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.query_row(
            "SELECT path, line, code FROM sym WHERE repo = ?1 AND sha = ?2 AND kind = ?3 AND name = ?4",
            params![key.repository, key.content_hash, key.kind.as_str(), key.name],
            |row| {
                Ok(SymbolRecord {
                    file: row.get(0)?,
                    line: row.get::<_, i64>(1)? as usize,
                    code: row.get(2)?,
                })
            },
        )
        .optional()
    }

    pub fn put(&self, key: &CacheKey, record: &SymbolRecord) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT OR REPLACE INTO sym (repo, sha, kind, name, path, line, code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key.repository,
                key.content_hash,
                key.kind.as_str(),
                key.name,
                record.file,
                record.line as i64,
                record.code,
            ],
        )?;
        debug!(
            stage = "cache",
            event = "cache.warm.put",
            sha = %key.content_hash,
            kind = %key.kind,
            symbol = %key.name,
            "stored symbol in warm tier"
        );
        Ok(())
    }

    pub fn len(&self) -> rusqlite::Result<usize> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sym", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
