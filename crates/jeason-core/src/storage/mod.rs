//! # Storage Module
//!
//! Record persistence for the back-office.
//!
//! Two backends implement [`RecordStore`]:
//! - [`RedbStore`]: embedded redb database (ACID, crash safe, MVCC readers)
//! - [`MemoryStore`]: BTreeMap tables for tests and throwaway runs
//!
//! Stores deal in opaque bytes keyed by string. Typed access goes through
//! the [`Record`] trait and the envelope in [`crate::formats`].

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::CoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;

// =============================================================================
// TABLES
// =============================================================================

/// Every table the service persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Products,
    Careers,
    CareerApplications,
    QuoteRequests,
    Transactions,
    BankAccounts,
    Accounts,
    Sessions,
}

impl Table {
    /// All tables, in a fixed order.
    pub const ALL: [Table; 8] = [
        Table::Products,
        Table::Careers,
        Table::CareerApplications,
        Table::QuoteRequests,
        Table::Transactions,
        Table::BankAccounts,
        Table::Accounts,
        Table::Sessions,
    ];

    /// Stable on-disk table name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::Careers => "careers",
            Table::CareerApplications => "career_applications",
            Table::QuoteRequests => "quote_requests",
            Table::Transactions => "transactions",
            Table::BankAccounts => "bank_accounts",
            Table::Accounts => "accounts",
            Table::Sessions => "sessions",
        }
    }
}

/// Key for a numeric id. Zero-padded so string order equals numeric order.
#[must_use]
pub fn numeric_key(id: u64) -> String {
    format!("{id:020}")
}

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// A typed row living in one [`Table`].
pub trait Record: Serialize + DeserializeOwned {
    /// The table this record type is stored in.
    const TABLE: Table;

    /// The primary key of this row.
    fn key(&self) -> String;
}

// =============================================================================
// RECORDSTORE TRAIT
// =============================================================================

/// Byte-level table storage.
///
/// Implementations must make each call atomic on its own. Check-then-write
/// sequences go through [`RecordStore::update`].
pub trait RecordStore: Send + Sync {
    /// Fetch one value.
    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>, CoreError>;

    /// Insert or overwrite a value.
    fn put(&self, table: Table, key: &str, value: &[u8]) -> Result<(), CoreError>;

    /// Insert only if the key is free. Returns `false` if it was taken.
    fn put_new(&self, table: Table, key: &str, value: &[u8]) -> Result<bool, CoreError>;

    /// Read-modify-write one value in a single atomic step.
    ///
    /// `change` sees the current value (`None` if absent) and returns the
    /// value to store, or `None` to leave the row untouched. An error from
    /// `change` aborts without writing.
    fn update(
        &self,
        table: Table,
        key: &str,
        change: &mut dyn FnMut(Option<&[u8]>) -> Result<Option<Vec<u8>>, CoreError>,
    ) -> Result<(), CoreError>;

    /// Remove a key. Returns whether it existed.
    fn delete(&self, table: Table, key: &str) -> Result<bool, CoreError>;

    /// All rows in key order.
    fn scan(&self, table: Table) -> Result<Vec<(String, Vec<u8>)>, CoreError>;

    /// Number of rows in a table.
    fn count(&self, table: Table) -> Result<usize, CoreError>;

    /// Allocate the next id for a table (starts at 1, never reused).
    fn next_id(&self, table: Table) -> Result<u64, CoreError>;
}
