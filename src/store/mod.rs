//! Durable row store for tracker state
//!
//! The components persist their entities as JSON rows in three independent
//! tables. Each row carries its key, the owning user and the serialized value:
//! ```text
//! review_items       key = itemId
//! encounters         key = user \x1f language \x1f word
//! vocabulary_states  key = user \x1f language \x1f word
//! ```
//! Engines provide get / insert-if-absent / put / scan-by-user and an atomic
//! per-row `update`. Read-modify-write goes through `update`, which the SQLite
//! engine runs in an immediate transaction so separate processes sharing one
//! database file cannot interleave. [`KeyLocks`] queue same-key callers inside
//! one process before they reach the engine.

mod locks;
mod memory;
mod sqlite;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use locks::{KeyLocks, DEFAULT_SHARDS};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("Update on {0} returned without applying")]
    UpdateNotApplied(&'static str),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The three logically independent tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    ReviewItems,
    Encounters,
    VocabularyStates,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::ReviewItems, Table::Encounters, Table::VocabularyStates];

    /// Physical table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::ReviewItems => "review_items",
            Table::Encounters => "encounters",
            Table::VocabularyStates => "vocabulary_states",
        }
    }
}

/// A keyed row store holding serialized values
pub trait RowStore: Send + Sync {
    /// Fetch the value stored under `key`
    fn get(&self, table: Table, key: &str) -> Result<Option<String>>;

    /// Insert a row only if `key` is free. Returns `false` if it already existed.
    fn insert(&self, table: Table, key: &str, user_id: &str, value: &str) -> Result<bool>;

    /// Insert or replace a row
    fn put(&self, table: Table, key: &str, user_id: &str, value: &str) -> Result<()>;

    /// All values owned by `user_id`, in key order
    fn scan(&self, table: Table, user_id: &str) -> Result<Vec<String>>;

    /// Atomically read the row under `key`, pass it to `apply`, and store what
    /// `apply` returns. `Ok(None)` from `apply` leaves the row untouched; an
    /// error aborts without writing.
    fn update(
        &self,
        table: Table,
        key: &str,
        user_id: &str,
        apply: &mut dyn FnMut(Option<&str>) -> Result<Option<String>>,
    ) -> Result<()>;
}

/// Typed view over one table of a [`RowStore`]
pub struct Collection<T> {
    store: Arc<dyn RowStore>,
    table: Table,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table: self.table,
            _marker: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn RowStore>, table: Table) -> Self {
        Self {
            store,
            table,
            _marker: PhantomData,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn get(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(self.table, key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&self, key: &str, user_id: &str, value: &T) -> Result<bool> {
        let json = serde_json::to_string(value)?;
        self.store.insert(self.table, key, user_id, &json)
    }

    pub fn put(&self, key: &str, user_id: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.put(self.table, key, user_id, &json)
    }

    /// Read-modify-write one row atomically.
    ///
    /// `modify` sees the current value (if any) and returns the value to store.
    /// A domain error from `modify` is returned as-is and nothing is written.
    pub fn update<E, F>(&self, key: &str, user_id: &str, modify: F) -> std::result::Result<T, E>
    where
        F: FnOnce(Option<T>) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let mut modify = Some(modify);
        let mut outcome: Option<std::result::Result<T, E>> = None;

        self.store.update(self.table, key, user_id, &mut |current| {
            let Some(modify) = modify.take() else {
                return Ok(None);
            };
            let current = match current {
                Some(json) => Some(serde_json::from_str::<T>(json)?),
                None => None,
            };
            match modify(current) {
                Ok(value) => {
                    let json = serde_json::to_string(&value)?;
                    outcome = Some(Ok(value));
                    Ok(Some(json))
                }
                Err(err) => {
                    outcome = Some(Err(err));
                    Ok(None)
                }
            }
        })?;

        outcome.unwrap_or_else(|| Err(StoreError::UpdateNotApplied(self.table.name()).into()))
    }

    pub fn scan(&self, user_id: &str) -> Result<Vec<T>> {
        self.store
            .scan(self.table, user_id)?
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }
}
