//! Requests sent to the executor and the result shapes it returns

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ExecutorError, ExecutorResult};
use crate::planner::{Plan, TableRef};

/// Create-if-missing request for one schema object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProvisionRequest {
    CreateDatabase { db: String },
    CreateTable { table: TableRef },
    CreateIndex { table: TableRef, index: String },
    /// Resolves once the index is queryable, not merely created
    WaitIndex { table: TableRef, index: String },
}

impl ProvisionRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionRequest::CreateDatabase { .. } => "database",
            ProvisionRequest::CreateTable { .. } => "table",
            ProvisionRequest::CreateIndex { .. } => "index",
            ProvisionRequest::WaitIndex { .. } => "index_wait",
        }
    }

    /// `db`, `db.table` or `db.table#index`
    pub fn target(&self) -> String {
        match self {
            ProvisionRequest::CreateDatabase { db } => db.clone(),
            ProvisionRequest::CreateTable { table } => table.to_string(),
            ProvisionRequest::CreateIndex { table, index }
            | ProvisionRequest::WaitIndex { table, index } => format!("{}#{}", table, index),
        }
    }
}

/// Flags forwarded to the executor untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub raw: bool,
    pub debug: bool,
}

/// Rows a write applies to
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Id { table: TableRef, id: String },
    Plan(Plan),
}

impl Target {
    pub fn table(&self) -> &TableRef {
        match self {
            Target::Id { table, .. } => table,
            Target::Plan(plan) => &plan.table,
        }
    }
}

/// A native query
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Single row by primary key
    Get { table: TableRef, id: String },
    /// Rows whose secondary index value equals `key`
    GetAll {
        table: TableRef,
        index: String,
        key: Value,
    },
    Select(Plan),
    Insert {
        table: TableRef,
        document: Value,
        return_changes: bool,
    },
    Update {
        target: Target,
        attrs: Value,
        return_changes: bool,
    },
    Delete { target: Target },
}

impl Query {
    pub fn table(&self) -> &TableRef {
        match self {
            Query::Get { table, .. }
            | Query::GetAll { table, .. }
            | Query::Insert { table, .. } => table,
            Query::Select(plan) => &plan.table,
            Query::Update { target, .. } | Query::Delete { target } => target.table(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Query::Get { .. } => "get",
            Query::GetAll { .. } => "get_all",
            Query::Select(_) => "select",
            Query::Insert { .. } => "insert",
            Query::Update { .. } => "update",
            Query::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = |t: &Target| match t {
            Target::Id { table, id } => format!("table({}).get({:?})", table, id),
            Target::Plan(plan) => plan.describe(),
        };
        match self {
            Query::Get { table, id } => write!(f, "table({}).get({:?})", table, id),
            Query::GetAll { table, index, key } => {
                write!(f, "table({}).getAll({}, index={})", table, key, index)
            }
            Query::Select(plan) => write!(f, "{}", plan),
            Query::Insert { table, .. } => write!(f, "table({}).insert(..)", table),
            Query::Update { target: t, .. } => write!(f, "{}.update(..)", target(t)),
            Query::Delete { target: t } => write!(f, "{}.delete()", target(t)),
        }
    }
}

/// Prior and new value of one affected row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub old_val: Option<Value>,
    pub new_val: Option<Value>,
}

/// Result of a write
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub inserted: u64,
    pub replaced: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub deleted: u64,
    #[serde(default)]
    pub generated_keys: Vec<String>,
    /// Filled only when changes were requested
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl WriteSummary {
    /// New values of every changed row, in change order
    pub fn new_values(&self) -> Vec<Value> {
        self.changes
            .iter()
            .filter_map(|c| c.new_val.clone())
            .collect()
    }
}

/// What the executor hands back
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Document(Option<Value>),
    Documents(Vec<Value>),
    Changes(WriteSummary),
}

impl QueryOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOutput::Document(_) => "document",
            QueryOutput::Documents(_) => "documents",
            QueryOutput::Changes(_) => "changes",
        }
    }

    pub fn into_document(self) -> ExecutorResult<Option<Value>> {
        match self {
            QueryOutput::Document(doc) => Ok(doc),
            other => Err(ExecutorError::unexpected_shape("document", other.kind())),
        }
    }

    pub fn into_documents(self) -> ExecutorResult<Vec<Value>> {
        match self {
            QueryOutput::Documents(docs) => Ok(docs),
            other => Err(ExecutorError::unexpected_shape("documents", other.kind())),
        }
    }

    pub fn into_changes(self) -> ExecutorResult<WriteSummary> {
        match self {
            QueryOutput::Changes(summary) => Ok(summary),
            other => Err(ExecutorError::unexpected_shape("changes", other.kind())),
        }
    }
}
