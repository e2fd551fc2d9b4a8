//! In-memory [`RecordStore`] backed by BTreeMaps.

use super::{RecordStore, Table};
use crate::CoreError;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<Table, BTreeMap<String, Vec<u8>>>,
    sequences: BTreeMap<Table, u64>,
}

/// Volatile store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, CoreError> {
        self.inner
            .read()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, CoreError> {
        self.inner
            .write()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(self
            .read()?
            .rows
            .get(&table)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    fn put(&self, table: Table, key: &str, value: &[u8]) -> Result<(), CoreError> {
        self.write()?
            .rows
            .entry(table)
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn put_new(&self, table: Table, key: &str, value: &[u8]) -> Result<bool, CoreError> {
        let mut tables = self.write()?;
        let rows = tables.rows.entry(table).or_default();
        if rows.contains_key(key) {
            return Ok(false);
        }
        rows.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn update(
        &self,
        table: Table,
        key: &str,
        change: &mut dyn FnMut(Option<&[u8]>) -> Result<Option<Vec<u8>>, CoreError>,
    ) -> Result<(), CoreError> {
        let mut tables = self.write()?;
        let rows = tables.rows.entry(table).or_default();
        if let Some(value) = change(rows.get(key).map(Vec::as_slice))? {
            rows.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn delete(&self, table: Table, key: &str) -> Result<bool, CoreError> {
        Ok(self
            .write()?
            .rows
            .get_mut(&table)
            .is_some_and(|rows| rows.remove(key).is_some()))
    }

    fn scan(&self, table: Table) -> Result<Vec<(String, Vec<u8>)>, CoreError> {
        Ok(self
            .read()?
            .rows
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count(&self, table: Table) -> Result<usize, CoreError> {
        Ok(self.read()?.rows.get(&table).map_or(0, BTreeMap::len))
    }

    fn next_id(&self, table: Table) -> Result<u64, CoreError> {
        let mut tables = self.write()?;
        let seq = tables.sequences.entry(table).or_insert(0);
        *seq = seq.saturating_add(1);
        Ok(*seq)
    }
}
