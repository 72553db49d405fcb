//! SQLite-backed row store

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{Result, RowStore, StoreError, Table};

/// How long a writer waits for another connection's lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Durable row store in a single SQLite database file.
///
/// Each [`Table`] maps to its own physical table. Values are stored as JSON
/// text next to the owning user id, which is indexed for per-user scans.
/// Several processes may open the same file; `update` takes the database write
/// lock up front so their read-modify-write cycles serialize.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init_schema(&conn)?;
        log::info!("Opened tracker database at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    /// Path of the database file, if file-backed
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        for table in Table::ALL {
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {name} (
                    key TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
                );
                CREATE INDEX IF NOT EXISTS idx_{name}_user_id ON {name}(user_id);
                "#,
                name = table.name()
            ))?;
        }
        Ok(())
    }

    fn conn(&self, table: Table) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned(table.name()))
    }
}

impl RowStore for SqliteStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<String>> {
        let conn = self.conn(table)?;
        let value = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", table.name()),
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn insert(&self, table: Table, key: &str, user_id: &str, value: &str) -> Result<bool> {
        let conn = self.conn(table)?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (key, user_id, value) VALUES (?1, ?2, ?3)",
                table.name()
            ),
            params![key, user_id, value],
        )?;
        Ok(inserted == 1)
    }

    fn put(&self, table: Table, key: &str, user_id: &str, value: &str) -> Result<()> {
        let conn = self.conn(table)?;
        conn.execute(
            &format!(
                "INSERT INTO {} (key, user_id, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    user_id = excluded.user_id,
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP",
                table.name()
            ),
            params![key, user_id, value],
        )?;
        Ok(())
    }

    fn scan(&self, table: Table, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn(table)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT value FROM {} WHERE user_id = ?1 ORDER BY key",
            table.name()
        ))?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn update(
        &self,
        table: Table,
        key: &str,
        user_id: &str,
        apply: &mut dyn FnMut(Option<&str>) -> Result<Option<String>>,
    ) -> Result<()> {
        let mut conn = self.conn(table)?;
        // IMMEDIATE takes the write lock before the read, so no other
        // connection can commit between our SELECT and our write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", table.name()),
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        // Dropping `tx` on an early return rolls back.
        if let Some(value) = apply(current.as_deref())? {
            tx.execute(
                &format!(
                    "INSERT INTO {} (key, user_id, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        user_id = excluded.user_id,
                        value = excluded.value,
                        updated_at = CURRENT_TIMESTAMP",
                    table.name()
                ),
                params![key, user_id, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
