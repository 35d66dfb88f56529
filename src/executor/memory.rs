//! In-memory executor
//!
//! Reference `DocumentExecutor` with the same observable contract as a real
//! document database driver:
//!
//! - databases and tables must be created before use
//! - a new secondary index is unusable until waited on
//! - writes return change arrays when asked
//!
//! Rows are held per table in primary-key order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use uuid::Uuid;

use super::errors::{ExecutorError, ExecutorResult};
use super::query::{Change, ProvisionRequest, Query, QueryOutput, RunOptions, Target, WriteSummary};
use super::sorter::ResultSorter;
use super::{DocumentExecutor, ExecFuture};
use crate::planner::{json_eq, Plan, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexState {
    Building,
    Ready,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<String, Value>,
    indexes: BTreeMap<String, IndexState>,
}

impl Table {
    fn select(&self, plan: &Plan) -> Vec<Value> {
        let filter = plan.filter();
        let mut docs: Vec<Value> = self
            .rows
            .values()
            .filter(|doc| filter.map_or(true, |expr| expr.matches(doc)))
            .cloned()
            .collect();

        ResultSorter::sort(&mut docs, &plan.order_by());

        let skip = usize::try_from(plan.skip()).unwrap_or(usize::MAX);
        let limit = plan
            .limit()
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        docs.into_iter().skip(skip).take(limit).collect()
    }

    fn target_ids(&self, target: &Target) -> Vec<String> {
        match target {
            Target::Id { id, .. } => vec![id.clone()],
            Target::Plan(plan) => self
                .select(plan)
                .iter()
                .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(str::to_string))
                .collect(),
        }
    }

    fn get_all(&self, table: &TableRef, index: &str, key: &Value) -> ExecutorResult<Vec<Value>> {
        match self.indexes.get(index) {
            None => Err(ExecutorError::IndexMissing {
                table: table.to_string(),
                index: index.to_string(),
            }),
            Some(IndexState::Building) => Err(ExecutorError::IndexNotReady {
                table: table.to_string(),
                index: index.to_string(),
            }),
            Some(IndexState::Ready) => Ok(self
                .rows
                .values()
                .filter(|doc| {
                    doc.get(index)
                        .is_some_and(|v| !v.is_null() && json_eq(v, key))
                })
                .cloned()
                .collect()),
        }
    }

    fn insert(&mut self, document: Value, return_changes: bool) -> ExecutorResult<WriteSummary> {
        let mut obj = match document {
            Value::Object(map) => map,
            other => {
                return Err(ExecutorError::InvalidDocument(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        let mut summary = WriteSummary::default();
        let id = match obj.get("id") {
            Some(Value::String(id)) => id.clone(),
            None | Some(Value::Null) => {
                let id = Uuid::new_v4().to_string();
                obj.insert("id".to_string(), Value::String(id.clone()));
                summary.generated_keys.push(id.clone());
                id
            }
            Some(other) => {
                return Err(ExecutorError::InvalidDocument(format!(
                    "id must be a string, got {}",
                    other
                )))
            }
        };

        if self.rows.contains_key(&id) {
            return Err(ExecutorError::failed(format!(
                "Duplicate primary key `id`: {}",
                id
            )));
        }

        let doc = Value::Object(obj);
        self.rows.insert(id, doc.clone());
        summary.inserted = 1;
        if return_changes {
            summary.changes.push(Change {
                old_val: None,
                new_val: Some(doc),
            });
        }
        Ok(summary)
    }

    fn update(
        &mut self,
        ids: Vec<String>,
        attrs: &Value,
        return_changes: bool,
    ) -> ExecutorResult<WriteSummary> {
        let patch = attrs.as_object().ok_or_else(|| {
            ExecutorError::InvalidDocument(format!("expected an object, got {}", attrs))
        })?;

        let mut summary = WriteSummary::default();
        for id in ids {
            let existing = match self.rows.get(&id) {
                Some(doc) => doc.clone(),
                None => {
                    summary.skipped += 1;
                    continue;
                }
            };

            let mut updated = existing.clone();
            if let Some(obj) = updated.as_object_mut() {
                for (key, value) in patch {
                    if key == "id" && value.as_str() != Some(id.as_str()) {
                        return Err(ExecutorError::InvalidDocument(
                            "primary key `id` cannot be changed".to_string(),
                        ));
                    }
                    obj.insert(key.clone(), value.clone());
                }
            }

            if updated == existing {
                summary.unchanged += 1;
                continue;
            }

            self.rows.insert(id, updated.clone());
            summary.replaced += 1;
            if return_changes {
                summary.changes.push(Change {
                    old_val: Some(existing),
                    new_val: Some(updated),
                });
            }
        }
        Ok(summary)
    }

    fn delete(&mut self, ids: Vec<String>) -> WriteSummary {
        let mut summary = WriteSummary::default();
        for id in ids {
            if self.rows.remove(&id).is_some() {
                summary.deleted += 1;
            } else {
                summary.skipped += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Default)]
struct Catalog {
    databases: BTreeMap<String, BTreeMap<String, Table>>,
}

impl Catalog {
    fn table(&self, table: &TableRef) -> ExecutorResult<&Table> {
        self.databases
            .get(&table.db)
            .ok_or_else(|| ExecutorError::DatabaseMissing(table.db.clone()))?
            .get(&table.table)
            .ok_or_else(|| ExecutorError::TableMissing(table.to_string()))
    }

    fn table_mut(&mut self, table: &TableRef) -> ExecutorResult<&mut Table> {
        self.databases
            .get_mut(&table.db)
            .ok_or_else(|| ExecutorError::DatabaseMissing(table.db.clone()))?
            .get_mut(&table.table)
            .ok_or_else(|| ExecutorError::TableMissing(table.to_string()))
    }

    fn apply_provision(&mut self, request: &ProvisionRequest) -> ExecutorResult<bool> {
        match request {
            ProvisionRequest::CreateDatabase { db } => {
                if self.databases.contains_key(db) {
                    return Ok(false);
                }
                self.databases.insert(db.clone(), BTreeMap::new());
                Ok(true)
            }
            ProvisionRequest::CreateTable { table } => {
                let tables = self
                    .databases
                    .get_mut(&table.db)
                    .ok_or_else(|| ExecutorError::DatabaseMissing(table.db.clone()))?;
                if tables.contains_key(&table.table) {
                    return Ok(false);
                }
                tables.insert(table.table.clone(), Table::default());
                Ok(true)
            }
            ProvisionRequest::CreateIndex { table, index } => {
                let t = self.table_mut(table)?;
                if t.indexes.contains_key(index) {
                    return Ok(false);
                }
                t.indexes.insert(index.clone(), IndexState::Building);
                Ok(true)
            }
            ProvisionRequest::WaitIndex { table, index } => {
                let t = self.table_mut(table)?;
                match t.indexes.get_mut(index) {
                    Some(state) => {
                        *state = IndexState::Ready;
                        Ok(true)
                    }
                    None => Err(ExecutorError::IndexMissing {
                        table: table.to_string(),
                        index: index.clone(),
                    }),
                }
            }
        }
    }
}

/// Executor backed by in-process maps
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    catalog: RwLock<Catalog>,
    provision_log: Mutex<Vec<ProvisionRequest>>,
    denied_targets: Mutex<Vec<String>>,
    outage: Mutex<Option<String>>,
    queries_run: AtomicUsize,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every provisioning request received, in arrival order
    pub fn provision_log(&self) -> Vec<ProvisionRequest> {
        self.provision_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Number of provisioning requests of a kind (`database`, `table`, `index`, `index_wait`)
    pub fn provision_count(&self, kind: &str) -> usize {
        self.provision_log()
            .iter()
            .filter(|request| request.kind() == kind)
            .count()
    }

    /// Makes provisioning of `target` (`db`, `db.table`, `db.table#index`) fail
    pub fn deny_provisioning(&self, target: impl Into<String>) {
        if let Ok(mut denied) = self.denied_targets.lock() {
            denied.push(target.into());
        }
    }

    /// While set, every query fails with the given message
    pub fn set_outage(&self, message: Option<String>) {
        if let Ok(mut outage) = self.outage.lock() {
            *outage = message;
        }
    }

    /// Number of queries run, including failed ones
    pub fn queries_run(&self) -> usize {
        self.queries_run.load(Ordering::SeqCst)
    }

    /// Creates the database and table if needed and inserts `docs` directly
    pub fn seed(&self, table: &TableRef, docs: Vec<Value>) -> ExecutorResult<()> {
        let mut catalog = self.write()?;
        catalog.apply_provision(&ProvisionRequest::CreateDatabase {
            db: table.db.clone(),
        })?;
        catalog.apply_provision(&ProvisionRequest::CreateTable {
            table: table.clone(),
        })?;
        let t = catalog.table_mut(table)?;
        for doc in docs {
            t.insert(doc, false)?;
        }
        Ok(())
    }

    /// Snapshot of a table's rows in primary-key order
    pub fn rows(&self, table: &TableRef) -> ExecutorResult<Vec<Value>> {
        let catalog = self.read()?;
        Ok(catalog.table(table)?.rows.values().cloned().collect())
    }

    fn read(&self) -> ExecutorResult<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|e| ExecutorError::failed(e.to_string()))
    }

    fn write(&self) -> ExecutorResult<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|e| ExecutorError::failed(e.to_string()))
    }

    fn lock_log(&self) -> ExecutorResult<MutexGuard<'_, Vec<ProvisionRequest>>> {
        self.provision_log
            .lock()
            .map_err(|e| ExecutorError::failed(e.to_string()))
    }

    fn is_denied(&self, target: &str) -> ExecutorResult<bool> {
        let denied = self
            .denied_targets
            .lock()
            .map_err(|e| ExecutorError::failed(e.to_string()))?;
        Ok(denied.iter().any(|t| t == target))
    }

    fn current_outage(&self) -> ExecutorResult<Option<String>> {
        let outage = self
            .outage
            .lock()
            .map_err(|e| ExecutorError::failed(e.to_string()))?;
        Ok(outage.clone())
    }

    fn execute(&self, query: Query) -> ExecutorResult<QueryOutput> {
        match query {
            Query::Get { table, id } => {
                let catalog = self.read()?;
                let doc = catalog.table(&table)?.rows.get(&id).cloned();
                Ok(QueryOutput::Document(doc))
            }
            Query::GetAll { table, index, key } => {
                let catalog = self.read()?;
                let docs = catalog.table(&table)?.get_all(&table, &index, &key)?;
                Ok(QueryOutput::Documents(docs))
            }
            Query::Select(plan) => {
                let catalog = self.read()?;
                Ok(QueryOutput::Documents(catalog.table(&plan.table)?.select(&plan)))
            }
            Query::Insert {
                table,
                document,
                return_changes,
            } => {
                let mut catalog = self.write()?;
                let summary = catalog.table_mut(&table)?.insert(document, return_changes)?;
                Ok(QueryOutput::Changes(summary))
            }
            Query::Update {
                target,
                attrs,
                return_changes,
            } => {
                let mut catalog = self.write()?;
                let t = catalog.table_mut(target.table())?;
                let ids = t.target_ids(&target);
                Ok(QueryOutput::Changes(t.update(ids, &attrs, return_changes)?))
            }
            Query::Delete { target } => {
                let mut catalog = self.write()?;
                let t = catalog.table_mut(target.table())?;
                let ids = t.target_ids(&target);
                Ok(QueryOutput::Changes(t.delete(ids)))
            }
        }
    }
}

impl DocumentExecutor for MemoryExecutor {
    fn provision(&self, request: ProvisionRequest) -> ExecFuture<'_, bool> {
        Box::pin(async move {
            // Let concurrent callers interleave like a networked driver would
            tokio::task::yield_now().await;

            self.lock_log()?.push(request.clone());

            if self.is_denied(&request.target())? {
                return Err(ExecutorError::failed(format!(
                    "permission denied: cannot create {} '{}'",
                    request.kind(),
                    request.target()
                )));
            }

            self.write()?.apply_provision(&request)
        })
    }

    fn run(&self, query: Query, _options: RunOptions) -> ExecFuture<'_, QueryOutput> {
        Box::pin(async move {
            tokio::task::yield_now().await;

            self.queries_run.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.current_outage()? {
                return Err(ExecutorError::failed(message));
            }

            self.execute(query)
        })
    }
}
