//! Provisioning registry
//!
//! Maps each schema object key to a shared ready-future. The first caller for
//! a key installs the future; every later caller gets a clone of it. Entries
//! are never evicted, so a failed outcome is observed again by later callers.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use super::errors::{ProvisionError, ProvisionResult};
use crate::planner::TableRef;

/// Shared handle resolving once the object is usable
pub type ReadySignal = Shared<BoxFuture<'static, ProvisionResult<()>>>;

/// Observable state of one registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionStatus {
    /// Not yet requested by anyone
    Unknown,
    /// Requested, not finished
    Pending,
    Ready,
    Failed(ProvisionError),
}

/// Grow-only map of key → ready-signal
pub struct SignalMap<K> {
    entries: Mutex<HashMap<K, ReadySignal>>,
}

impl<K: Eq + Hash> SignalMap<K> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the signal for `key`, installing `start()` if absent.
    ///
    /// `start` runs under the map lock and must not block.
    pub fn get_or_start<F>(&self, key: K, start: F) -> ReadySignal
    where
        F: FnOnce() -> BoxFuture<'static, ProvisionResult<()>>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key)
            .or_insert_with(|| start().shared())
            .clone()
    }

    pub fn status(&self, key: &K) -> ProvisionStatus {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            None => ProvisionStatus::Unknown,
            Some(signal) => match signal.peek() {
                None => ProvisionStatus::Pending,
                Some(Ok(())) => ProvisionStatus::Ready,
                Some(Err(err)) => ProvisionStatus::Failed(err.clone()),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash> Default for SignalMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-adapter registry of databases, tables and indexes
#[derive(Default)]
pub struct ProvisionRegistry {
    pub(crate) databases: SignalMap<String>,
    pub(crate) tables: SignalMap<TableRef>,
    pub(crate) indexes: SignalMap<(TableRef, String)>,
}

impl ProvisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_status(&self, db: &str) -> ProvisionStatus {
        self.databases.status(&db.to_string())
    }

    pub fn table_status(&self, table: &TableRef) -> ProvisionStatus {
        self.tables.status(table)
    }

    pub fn index_status(&self, table: &TableRef, index: &str) -> ProvisionStatus {
        self.indexes.status(&(table.clone(), index.to_string()))
    }

    /// Number of tracked (databases, tables, indexes)
    pub fn tracked(&self) -> (usize, usize, usize) {
        (self.databases.len(), self.tables.len(), self.indexes.len())
    }
}
