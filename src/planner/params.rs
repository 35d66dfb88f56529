//! Query parameter normalization
//!
//! Raw ORM-style parameters accept shorthand forms:
//!
//! - `sort` for `orderBy`, `offset` for `skip`
//! - any non-reserved top-level key is a `where` entry
//! - `orderBy` as a bare field name, a single `[field, dir]` pair, or a list
//!
//! Normalization never mutates the caller's value.

use serde_json::{json, Map, Value};

use super::ast::{Condition, FilterSpec, Operator, SortClause, SortDirection};
use super::errors::{PlannerError, PlannerResult};

/// Keys that are never folded into `where`
pub const RESERVED_KEYS: [&str; 6] = ["orderBy", "sort", "limit", "offset", "skip", "where"];

/// Canonical query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub filter: FilterSpec,
    pub order_by: Vec<SortClause>,
    /// 0 means no skip stage
    pub skip: u64,
    /// 0 means no limit stage
    pub limit: u64,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes raw parameters
    pub fn from_json(raw: &Value) -> PlannerResult<Self> {
        let params = match raw {
            Value::Null => return Ok(Self::new()),
            Value::Object(map) => map,
            other => {
                return Err(PlannerError::InvalidParams(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        let mut where_map = match params.get("where") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(PlannerError::InvalidWhere(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let criteria = if value.is_object() {
                value.clone()
            } else {
                json!({ "==": value })
            };
            where_map.insert(key.clone(), criteria);
        }

        let order_by = match pick(params, "orderBy", "sort") {
            Some(value) if !is_falsy(value) => parse_order_by(value)?,
            _ => Vec::new(),
        };

        let skip = match pick(params, "skip", "offset") {
            Some(value) => parse_count("skip", value)?,
            None => 0,
        };

        let limit = match params.get("limit") {
            Some(value) => parse_count("limit", value)?,
            None => 0,
        };

        Ok(Self {
            filter: FilterSpec::from_map(&where_map)?,
            order_by,
            skip,
            limit,
        })
    }

    /// Adds an equality condition
    pub fn where_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.push(field, Condition::and(Operator::Eq, value));
        self
    }

    /// Adds a condition
    pub fn where_cond(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.filter.push(field, condition);
        self
    }

    /// Appends a sort clause
    pub fn order_by(mut self, clause: SortClause) -> Self {
        self.order_by.push(clause);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// The primary key's value unless it is falsy, then the alias's
fn pick<'a>(params: &'a Map<String, Value>, primary: &str, alias: &str) -> Option<&'a Value> {
    match params.get(primary) {
        Some(value) if !is_falsy(value) => Some(value),
        fallback => params
            .get(alias)
            .filter(|value| !is_falsy(value))
            .or(fallback),
    }
}

/// Parses a non-negative count; falsy values are 0
fn parse_count(key: &str, value: &Value) -> PlannerResult<u64> {
    if is_falsy(value) {
        return Ok(0);
    }
    match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return Ok(count);
            }
            match n.as_f64() {
                Some(f) if f < 0.0 => Err(PlannerError::invalid_pagination(
                    key,
                    "must not be negative",
                )),
                Some(f) if f.fract() == 0.0 => Ok(f as u64),
                _ => Err(PlannerError::invalid_pagination(key, "must be an integer")),
            }
        }
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| {
            PlannerError::invalid_pagination(key, format!("'{}' is not a non-negative integer", s))
        }),
        other => Err(PlannerError::invalid_pagination(
            key,
            format!("unexpected value {}", other),
        )),
    }
}

fn parse_order_by(value: &Value) -> PlannerResult<Vec<SortClause>> {
    match value {
        Value::String(field) => Ok(vec![SortClause::asc(field.clone())]),
        Value::Array(items) => {
            if is_single_pair(items) {
                return Ok(vec![parse_clause(value)?]);
            }
            items.iter().map(parse_clause).collect()
        }
        other => Err(PlannerError::InvalidOrderBy(format!(
            "expected a field name or a list, got {}",
            other
        ))),
    }
}

/// `["name", "desc"]` is one clause, not two fields
fn is_single_pair(items: &[Value]) -> bool {
    matches!(items, [Value::String(_), Value::String(dir)] if SortDirection::is_keyword(dir))
}

fn parse_clause(value: &Value) -> PlannerResult<SortClause> {
    match value {
        Value::String(field) => Ok(SortClause::asc(field.clone())),
        Value::Array(pair) => match pair.as_slice() {
            [Value::String(field)] => Ok(SortClause::asc(field.clone())),
            [Value::String(field), direction] => Ok(SortClause {
                field: field.clone(),
                direction: direction
                    .as_str()
                    .map(SortDirection::parse_lenient)
                    .unwrap_or_default(),
            }),
            _ => Err(PlannerError::InvalidOrderBy(format!(
                "expected [field, direction], got {}",
                value
            ))),
        },
        other => Err(PlannerError::InvalidOrderBy(format!(
            "expected a clause, got {}",
            other
        ))),
    }
}
