//! # Backoffice
//!
//! The service handle the HTTP layer talks to.
//!
//! `Backoffice` owns a [`RecordStore`] and provides typed record access.
//! The domain operations live next to their rules in `catalog`, `careers`,
//! `quotes`, `payments`, `auth` and `cart`, each as an `impl Backoffice`
//! block.

use crate::formats::{decode_record, encode_record};
use crate::storage::{Record, RecordStore, Table};
use crate::{CoreError, PaymentStatus};
use serde::Serialize;
use std::sync::Arc;

/// Shared handle over one store. Cheap to clone.
#[derive(Clone)]
pub struct Backoffice {
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for Backoffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoffice").finish()
    }
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub products: usize,
    pub careers: usize,
    pub pending_quotes: usize,
    pub pending_applications: usize,
    pub pending_transactions: usize,
}

impl Backoffice {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// A backoffice over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::storage::MemoryStore::new()))
    }

    // =========================================================================
    // TYPED RECORD ACCESS
    // =========================================================================

    pub(crate) fn next_id(&self, table: Table) -> Result<u64, CoreError> {
        self.store.next_id(table)
    }

    pub(crate) fn load<R: Record>(&self, key: &str) -> Result<Option<R>, CoreError> {
        self.store
            .get(R::TABLE, key)?
            .map(|bytes| decode_record(&bytes))
            .transpose()
    }

    pub(crate) fn save<R: Record>(&self, record: &R) -> Result<(), CoreError> {
        let bytes = encode_record(record)?;
        self.store.put(R::TABLE, &record.key(), &bytes)
    }

    /// Insert a record whose key must not exist yet.
    pub(crate) fn save_new<R: Record>(&self, record: &R) -> Result<bool, CoreError> {
        let bytes = encode_record(record)?;
        self.store.put_new(R::TABLE, &record.key(), &bytes)
    }

    /// Load, check and rewrite one record atomically.
    ///
    /// `change` runs against the stored record while no other write can
    /// interleave. Returning an error leaves the record as it was. `Ok(None)`
    /// means the key does not exist.
    pub(crate) fn modify<R: Record>(
        &self,
        key: &str,
        change: impl FnOnce(&mut R) -> Result<(), CoreError>,
    ) -> Result<Option<R>, CoreError> {
        let mut change = Some(change);
        let mut updated = None;
        self.store.update(R::TABLE, key, &mut |current| {
            let Some(bytes) = current else {
                return Ok(None);
            };
            let mut record: R = decode_record(bytes)?;
            let change = change
                .take()
                .ok_or_else(|| CoreError::Storage("record update ran twice".to_string()))?;
            change(&mut record)?;
            let encoded = encode_record(&record)?;
            updated = Some(record);
            Ok(Some(encoded))
        })?;
        Ok(updated)
    }

    pub(crate) fn remove<R: Record>(&self, key: &str) -> Result<bool, CoreError> {
        self.store.delete(R::TABLE, key)
    }

    /// Every record of a type, in key order.
    pub(crate) fn load_all<R: Record>(&self) -> Result<Vec<R>, CoreError> {
        self.store
            .scan(R::TABLE)?
            .iter()
            .map(|(_, bytes)| decode_record(bytes))
            .collect()
    }

    /// Row count for a table.
    pub fn count(&self, table: Table) -> Result<usize, CoreError> {
        self.store.count(table)
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    /// Dashboard counts across the back-office tables.
    pub fn summary(&self) -> Result<Summary, CoreError> {
        let pending_quotes = self
            .list_quotes()?
            .iter()
            .filter(|q| q.status == crate::QuoteStatus::Pending)
            .count();
        let pending_applications = self
            .list_applications()?
            .iter()
            .filter(|a| a.status == crate::ApplicationStatus::Pending)
            .count();
        let pending_transactions = self
            .list_transactions(None)?
            .iter()
            .filter(|t| {
                matches!(
                    t.payment_status,
                    PaymentStatus::Pending | PaymentStatus::Processing
                )
            })
            .count();

        Ok(Summary {
            products: self.count(Table::Products)?,
            careers: self.count(Table::Careers)?,
            pending_quotes,
            pending_applications,
            pending_transactions,
        })
    }
}
