//! redb-backed [`RecordStore`].
//!
//! One redb table per [`Table`], plus a `sequences` table holding the last
//! id handed out for each numeric table. Id allocation runs in its own write
//! transaction, so concurrent inserts never share an id.

use super::{RecordStore, Table};
use crate::CoreError;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use std::path::Path;

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

fn definition(table: Table) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(table.name())
}

/// Disk-backed store.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish()
    }
}

impl RedbStore {
    /// Open or create a database file and make sure every table exists.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let db = Database::create(path).map_err(CoreError::storage)?;

        let txn = db.begin_write().map_err(CoreError::storage)?;
        {
            for table in Table::ALL {
                txn.open_table(definition(table))
                    .map_err(CoreError::storage)?;
            }
            txn.open_table(SEQUENCES).map_err(CoreError::storage)?;
        }
        txn.commit().map_err(CoreError::storage)?;

        Ok(Self { db })
    }
}

impl RecordStore for RedbStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let txn = self.db.begin_read().map_err(CoreError::storage)?;
        let rows = txn
            .open_table(definition(table))
            .map_err(CoreError::storage)?;
        let value = rows
            .get(key)
            .map_err(CoreError::storage)?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn put(&self, table: Table, key: &str, value: &[u8]) -> Result<(), CoreError> {
        let txn = self.db.begin_write().map_err(CoreError::storage)?;
        {
            let mut rows = txn
                .open_table(definition(table))
                .map_err(CoreError::storage)?;
            rows.insert(key, value).map_err(CoreError::storage)?;
        }
        txn.commit().map_err(CoreError::storage)
    }

    fn put_new(&self, table: Table, key: &str, value: &[u8]) -> Result<bool, CoreError> {
        let txn = self.db.begin_write().map_err(CoreError::storage)?;
        {
            let mut rows = txn
                .open_table(definition(table))
                .map_err(CoreError::storage)?;
            let taken = rows.get(key).map_err(CoreError::storage)?.is_some();
            if taken {
                return Ok(false);
            }
            rows.insert(key, value).map_err(CoreError::storage)?;
        }
        txn.commit().map_err(CoreError::storage)?;
        Ok(true)
    }

    fn update(
        &self,
        table: Table,
        key: &str,
        change: &mut dyn FnMut(Option<&[u8]>) -> Result<Option<Vec<u8>>, CoreError>,
    ) -> Result<(), CoreError> {
        // redb allows one write transaction at a time, so the read and the
        // write below cannot interleave with another writer.
        let txn = self.db.begin_write().map_err(CoreError::storage)?;
        {
            let mut rows = txn
                .open_table(definition(table))
                .map_err(CoreError::storage)?;
            let current = rows
                .get(key)
                .map_err(CoreError::storage)?
                .map(|guard| guard.value().to_vec());
            let Some(value) = change(current.as_deref())? else {
                return Ok(());
            };
            rows.insert(key, value.as_slice())
                .map_err(CoreError::storage)?;
        }
        txn.commit().map_err(CoreError::storage)
    }

    fn delete(&self, table: Table, key: &str) -> Result<bool, CoreError> {
        let txn = self.db.begin_write().map_err(CoreError::storage)?;
        let existed = {
            let mut rows = txn
                .open_table(definition(table))
                .map_err(CoreError::storage)?;
            rows.remove(key).map_err(CoreError::storage)?.is_some()
        };
        txn.commit().map_err(CoreError::storage)?;
        Ok(existed)
    }

    fn scan(&self, table: Table) -> Result<Vec<(String, Vec<u8>)>, CoreError> {
        let txn = self.db.begin_read().map_err(CoreError::storage)?;
        let rows = txn
            .open_table(definition(table))
            .map_err(CoreError::storage)?;

        let mut out = Vec::new();
        for entry in rows.iter().map_err(CoreError::storage)? {
            let (key, value) = entry.map_err(CoreError::storage)?;
            out.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(out)
    }

    fn count(&self, table: Table) -> Result<usize, CoreError> {
        let txn = self.db.begin_read().map_err(CoreError::storage)?;
        let rows = txn
            .open_table(definition(table))
            .map_err(CoreError::storage)?;
        let len = rows.len().map_err(CoreError::storage)?;
        Ok(len as usize)
    }

    fn next_id(&self, table: Table) -> Result<u64, CoreError> {
        let txn = self.db.begin_write().map_err(CoreError::storage)?;
        let id = {
            let mut seqs = txn.open_table(SEQUENCES).map_err(CoreError::storage)?;
            let current = seqs
                .get(table.name())
                .map_err(CoreError::storage)?
                .map(|guard| guard.value())
                .unwrap_or(0);
            let next = current.saturating_add(1);
            seqs.insert(table.name(), next)
                .map_err(CoreError::storage)?;
            next
        };
        txn.commit().map_err(CoreError::storage)?;
        Ok(id)
    }
}
