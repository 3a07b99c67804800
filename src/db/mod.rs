//! SQLite storage for quadrant-tasks.
//!
//! One connection behind a mutex. Every statement runs through
//! [`Database::with_conn`], which the async [`crate::store::TaskStore`] impl
//! calls from `spawn_blocking`.

pub mod tasks;

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Applied to every connection, file-backed or not.
const COMMON_PRAGMAS: &str = "PRAGMA foreign_keys=ON;
     PRAGMA busy_timeout=5000;";

/// Name of the SQL function used for case-insensitive search.
pub(crate) const FOLD_CASE_FN: &str = "fold_case";

/// Task database handle. Clones share the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the task database at `path` and bring its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening task database at {}", path.display()))?;
        // WAL lets the HTTP API read while a reorder is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("enabling WAL on the task database")?;
        Self::from_connection(conn)
    }

    /// Fresh private database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory task database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(COMMON_PRAGMAS)
            .context("configuring task database connection")?;
        register_fold_case(&conn)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let report = embedded::migrations::runner()
            .run(&mut *conn)
            .context("applying task schema migrations")?;
        for migration in report.applied_migrations() {
            tracing::debug!(version = migration.version(), name = %migration.name(), "Migration applied");
        }
        Ok(())
    }

    /// A panic while holding the connection poisons it; later calls fail
    /// instead of touching a connection that may be mid-statement.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("task database connection poisoned by an earlier panic"))
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }
}

/// SQLite's `lower()` only folds ASCII; search must match `str::to_lowercase`.
fn register_fold_case(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
    .context("registering fold_case")
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fold_case_handles_non_ascii() {
        let db = Database::open_in_memory().unwrap();
        let folded: String = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT fold_case('ÄPFEL Straße')", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(folded, "äpfel straße");
    }

    #[test]
    fn open_error_names_the_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir").join("tasks.db");
        let err = Database::open(&missing).err().unwrap();
        assert!(format!("{:#}", err).contains("no-such-dir"));
    }

    #[test]
    fn file_database_uses_wal() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("tasks.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
