//! In-memory row store

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{Result, RowStore, StoreError, Table};

struct Row {
    user_id: String,
    value: String,
}

/// Row store kept entirely in memory. Used for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, BTreeMap<String, Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowStore for MemoryStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<String>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned(table.name()))?;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.get(key))
            .map(|row| row.value.clone()))
    }

    fn insert(&self, table: Table, key: &str, user_id: &str, value: &str) -> Result<bool> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned(table.name()))?;
        let rows = tables.entry(table).or_default();
        if rows.contains_key(key) {
            return Ok(false);
        }
        rows.insert(
            key.to_string(),
            Row {
                user_id: user_id.to_string(),
                value: value.to_string(),
            },
        );
        Ok(true)
    }

    fn put(&self, table: Table, key: &str, user_id: &str, value: &str) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned(table.name()))?;
        tables.entry(table).or_default().insert(
            key.to_string(),
            Row {
                user_id: user_id.to_string(),
                value: value.to_string(),
            },
        );
        Ok(())
    }

    fn scan(&self, table: Table, user_id: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned(table.name()))?;
        Ok(tables
            .get(&table)
            .map(|rows| {
                rows.values()
                    .filter(|row| row.user_id == user_id)
                    .map(|row| row.value.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn update(
        &self,
        table: Table,
        key: &str,
        user_id: &str,
        apply: &mut dyn FnMut(Option<&str>) -> Result<Option<String>>,
    ) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned(table.name()))?;
        let rows = tables.entry(table).or_default();
        let current = rows.get(key).map(|row| row.value.as_str());
        if let Some(value) = apply(current)? {
            rows.insert(
                key.to_string(),
                Row {
                    user_id: user_id.to_string(),
                    value,
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[test]
    fn test_insert_is_exclusive() {
        contract::insert_is_exclusive(&MemoryStore::new());
    }

    #[test]
    fn test_put_replaces() {
        contract::put_replaces(&MemoryStore::new());
    }

    #[test]
    fn test_tables_are_independent() {
        contract::tables_are_independent(&MemoryStore::new());
    }

    #[test]
    fn test_update_reads_and_writes() {
        contract::update_reads_and_writes(&MemoryStore::new());
    }

    #[test]
    fn test_update_skip_and_abort_leave_row() {
        contract::update_skip_and_abort_leave_row(&MemoryStore::new());
    }

    #[test]
    fn test_scan_filters_by_user() {
        contract::scan_filters_by_user(&MemoryStore::new());
    }
}
