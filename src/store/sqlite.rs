//! SQLite-backed key-value store
//!
//! The connection is opened lazily on first use. Opening runs the schema
//! migration before the connection is published, and every caller that
//! arrives while the open is in flight waits on the same initialization.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{KvStore, StoreError};

/// Schema version recorded in `PRAGMA user_version`
const SCHEMA_VERSION: i64 = 1;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS selected_cities (
    key   TEXT PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
)";

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Key-value store on a single SQLite table
#[derive(Debug)]
pub struct SqliteStore {
    location: Location,
    conn: OnceCell<Arc<Mutex<Connection>>>,
}

impl SqliteStore {
    /// Creates a store backed by the database file at `path`
    ///
    /// Nothing touches the filesystem until the first `get` or `put`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: OnceCell::new(),
        }
    }

    /// Creates a store backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: OnceCell::new(),
        }
    }

    /// Returns the ready connection, opening and migrating it on first use
    async fn connection(&self) -> Result<Arc<Mutex<Connection>>, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let location = self.location.clone();
                let conn = tokio::task::spawn_blocking(move || open_connection(&location))
                    .await
                    .map_err(|e| StoreError::Task(e.to_string()))??;
                Ok::<_, StoreError>(Arc::new(Mutex::new(conn)))
            })
            .await?;
        Ok(Arc::clone(conn))
    }
}

fn open_connection(location: &Location) -> Result<Connection, StoreError> {
    let mut conn = match location {
        Location::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Open(format!("{}: {}", parent.display(), e)))?;
            }
            info!(path = %path.display(), "Opening watch-list store");
            Connection::open(path)?
        }
        Location::Memory => Connection::open_in_memory()?,
    };
    migrate(&mut conn)?;
    Ok(conn)
}

/// Brings the schema up to `SCHEMA_VERSION`. Safe to run on every open.
fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        debug!(version, "Store schema up to date");
        return Ok(());
    }

    info!(from = version, to = SCHEMA_VERSION, "Upgrading store schema");
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(CREATE_TABLE_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    tx.commit()?;
    Ok(())
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.connection().await?;
        let key = key.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>, StoreError> {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
            let value = tx
                .query_row(
                    "SELECT value FROM selected_cities WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            tx.commit()?;
            Ok(value)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let conn = self.connection().await?;
        let key = key.to_string();
        let value = value.to_vec();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO selected_cities (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_key_returns_none() {
        let store = SqliteStore::in_memory();
        assert_eq!(store.get("selectedCities").await.expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = SqliteStore::in_memory();

        store.put("k", b"value").await.expect("put should succeed");

        assert_eq!(
            store.get("k").await.expect("get should succeed"),
            Some(b"value".to_vec())
        );
    }

    #[tokio::test]
    async fn test_put_replaces_existing_value() {
        let store = SqliteStore::in_memory();

        store.put("k", b"first").await.expect("put should succeed");
        store.put("k", b"second").await.expect("put should succeed");

        assert_eq!(
            store.get("k").await.expect("get should succeed"),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn test_operations_issued_before_open_completes_all_succeed() {
        let store = SqliteStore::in_memory();

        // None of these has a ready connection when it starts
        let (a, b, c) = tokio::join!(store.get("k"), store.put("k", b"v"), store.get("other"));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(c.is_ok());
        assert_eq!(store.get("k").await.expect("get should succeed"), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_value_survives_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("store.sqlite3");

        {
            let store = SqliteStore::open(&path);
            store.put("k", b"durable").await.expect("put should succeed");
        }

        let reopened = SqliteStore::open(&path);
        assert_eq!(
            reopened.get("k").await.expect("get should succeed"),
            Some(b"durable".to_vec())
        );
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().expect("open should succeed");

        migrate(&mut conn).expect("first migration should succeed");
        migrate(&mut conn).expect("second migration should succeed");

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .expect("version should be readable");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_recreates_missing_table() {
        let mut conn = Connection::open_in_memory().expect("open should succeed");
        migrate(&mut conn).expect("migration should succeed");

        // Simulate a database left at an older version without the table
        conn.execute_batch("DROP TABLE selected_cities; PRAGMA user_version = 0;")
            .expect("reset should succeed");
        migrate(&mut conn).expect("migration should succeed");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM selected_cities", [], |row| row.get(0))
            .expect("table should exist");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unopenable_path_reports_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").expect("Should write blocker file");

        let store = SqliteStore::open(blocker.join("store.sqlite3"));

        assert!(store.get("k").await.is_err());
        assert!(store.put("k", b"v").await.is_err());
    }
}
