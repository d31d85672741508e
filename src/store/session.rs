//! `SessionHandle`: a scoped acquisition of a database session.
//!
//! A session wraps one SQLite connection. Release is guaranteed on every
//! exit path — normal return, early `?`, or panic unwind — because it
//! happens in `Drop`, not in a method the caller has to remember to call.
//! Streamed BLOB payloads (`Connection::blob_open`) must be fully read
//! while the session is alive; `read_blob` below is the only path that
//! touches the incremental-I/O API, and it always returns owned bytes
//! before giving them back to the caller, so a decoded value can never
//! outlive the session that produced it.

use std::io::Read;
use std::path::Path;

use rusqlite::{Connection, DatabaseName, OpenFlags};
use tracing::debug;

use crate::error::{Result, StorageError};

pub struct SessionHandle {
    conn: Connection,
}

impl SessionHandle {
    /// Open a session against an on-disk database, creating the schema if
    /// this is the first time the file is touched.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(StorageError::Sqlite)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(StorageError::Sqlite)?;
        conn.execute_batch(super::schema::CREATE_SCHEMA)
            .map_err(StorageError::Sqlite)?;
        debug!(path = %path.display(), "session opened");
        Ok(Self { conn })
    }

    /// Open a purely in-memory session, used by tests and by ephemeral
    /// (never-persisted) analysis runs. Private to this connection only —
    /// a second session opened this way would see an empty database, so
    /// `SqliteStore` never calls this for a store that needs more than one
    /// session over its lifetime; see `open_shared_memory`.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::Sqlite)?;
        conn.execute_batch(super::schema::CREATE_SCHEMA)
            .map_err(StorageError::Sqlite)?;
        Ok(Self { conn })
    }

    /// Open a session against a named, shared-cache in-memory database:
    /// every session opened with the same `uri` sees the same data, as
    /// long as at least one connection to it stays open somewhere (SQLite
    /// tears a shared-cache memory database down once its last connection
    /// closes). `SqliteStore::open_in_memory` keeps exactly one such
    /// anchor connection alive for this purpose.
    pub fn open_shared_memory(uri: &str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            uri,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(StorageError::Sqlite)?;
        conn.execute_batch(super::schema::CREATE_SCHEMA)
            .map_err(StorageError::Sqlite)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, needed for `Connection::transaction`.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Fully read a BLOB column for one row via SQLite's incremental-I/O
    /// API. The returned bytes are owned and safe to use after the
    /// session closes; the live `Blob` stream itself never escapes this
    /// function, which is what makes the decode-before-release invariant
    /// hold mechanically rather than by convention.
    pub fn read_blob(&self, table: &str, column: &str, row_id: i64) -> Result<Vec<u8>> {
        let mut blob = self
            .conn
            .blob_open(DatabaseName::Main, table, column, row_id, true)
            .map_err(|e| StorageError::LoadFailed(format!("open blob {table}.{column}: {e}")))?;
        let mut bytes = Vec::with_capacity(blob.len());
        blob.read_to_end(&mut bytes)
            .map_err(|e| StorageError::LoadFailed(format!("read blob {table}.{column}: {e}")))?;
        Ok(bytes)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        debug!("session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_schema() {
        let session = SessionHandle::open_in_memory().unwrap();
        let count: i64 = session
            .connection()
            .query_row("SELECT COUNT(*) FROM nodes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
