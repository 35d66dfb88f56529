//! Query plan builder
//!
//! Stage order is fixed: scan → filter → order-by… → skip → limit.
//! The planner is deterministic: same inputs → same plan.

use std::fmt;

use serde_json::Value;

use super::ast::SortClause;
use super::compiler::compile;
use super::errors::PlannerResult;
use super::expr::Expr;
use super::params::QueryParams;
use crate::resource::ResourceDescriptor;

/// A table within a database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub db: String,
    pub table: String,
}

impl TableRef {
    pub fn new(db: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.table)
    }
}

/// One stage applied after the table scan
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Filter(Expr),
    /// Consecutive order-by stages form one ordering; the first is primary
    OrderBy(SortClause),
    Skip(u64),
    Limit(u64),
}

/// Immutable read plan over one table
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub table: TableRef,
    pub stages: Vec<Stage>,
}

impl Plan {
    /// Plain table scan
    pub fn scan(table: TableRef) -> Self {
        Self {
            table,
            stages: Vec::new(),
        }
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Filter(expr) => Some(expr),
            _ => None,
        })
    }

    pub fn order_by(&self) -> Vec<&SortClause> {
        self.stages
            .iter()
            .filter_map(|stage| match stage {
                Stage::OrderBy(clause) => Some(clause),
                _ => None,
            })
            .collect()
    }

    /// Rows to skip; 0 when there is no skip stage
    pub fn skip(&self) -> u64 {
        self.stages
            .iter()
            .find_map(|stage| match stage {
                Stage::Skip(n) => Some(*n),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn limit(&self) -> Option<u64> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Limit(n) => Some(*n),
            _ => None,
        })
    }

    /// Deterministic one-line rendering
    pub fn describe(&self) -> String {
        let mut out = format!("table({})", self.table);
        for stage in &self.stages {
            match stage {
                Stage::Filter(expr) => out.push_str(&format!(".filter({})", expr)),
                Stage::OrderBy(clause) => out.push_str(&format!(".orderBy({})", clause)),
                Stage::Skip(n) => out.push_str(&format!(".skip({})", n)),
                Stage::Limit(n) => out.push_str(&format!(".limit({})", n)),
            }
        }
        out
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Builds plans against a default database
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    default_db: String,
}

impl QueryPlanner {
    pub fn new(default_db: impl Into<String>) -> Self {
        Self {
            default_db: default_db.into(),
        }
    }

    /// The resource's table in the overriding or default database
    pub fn select_table(&self, resource: &ResourceDescriptor, db: Option<&str>) -> TableRef {
        TableRef::new(db.unwrap_or(&self.default_db), resource.table.clone())
    }

    /// Normalizes raw parameters and builds the plan
    pub fn build_plan(
        &self,
        resource: &ResourceDescriptor,
        raw: &Value,
        db: Option<&str>,
    ) -> PlannerResult<Plan> {
        let params = QueryParams::from_json(raw)?;
        Ok(self.plan_params(resource, &params, db))
    }

    /// Builds the plan for already-normalized parameters
    pub fn plan_params(
        &self,
        resource: &ResourceDescriptor,
        params: &QueryParams,
        db: Option<&str>,
    ) -> Plan {
        let mut plan = Plan::scan(self.select_table(resource, db));

        if let Some(expr) = compile(&params.filter) {
            plan.stages.push(Stage::Filter(expr));
        }

        for clause in &params.order_by {
            plan.stages.push(Stage::OrderBy(clause.clone()));
        }

        if params.skip > 0 {
            plan.stages.push(Stage::Skip(params.skip));
        }

        if params.limit > 0 {
            plan.stages.push(Stage::Limit(params.limit));
        }

        plan
    }
}
