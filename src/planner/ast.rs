//! Filter and sort structures
//!
//! A `FilterSpec` is the normalized form of a `where` clause: an ordered list
//! of fields, each with an ordered list of conditions.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::errors::{PlannerError, PlannerResult};

/// Comparison operators accepted in `where` clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `===`
    StrictEq,
    /// `!=`
    Ne,
    /// `!==`
    StrictNe,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `in`: field value is a member of the given collection
    In,
    /// `notIn`
    NotIn,
    /// `isectEmpty`: field collection shares nothing with the given collection
    IsectEmpty,
    /// `isectNotEmpty`
    IsectNotEmpty,
}

impl Operator {
    /// Returns the operator symbol without the OR prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::StrictEq => "===",
            Operator::Ne => "!=",
            Operator::StrictNe => "!==",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::IsectEmpty => "isectEmpty",
            Operator::IsectNotEmpty => "isectNotEmpty",
        }
    }

    /// Set operators read a missing field as an empty collection
    pub fn is_set_operator(&self) -> bool {
        matches!(
            self,
            Operator::In | Operator::NotIn | Operator::IsectEmpty | Operator::IsectNotEmpty
        )
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => Operator::Eq,
            "===" => Operator::StrictEq,
            "!=" => Operator::Ne,
            "!==" => Operator::StrictNe,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "isectEmpty" => Operator::IsectEmpty,
            "isectNotEmpty" => Operator::IsectNotEmpty,
            _ => return Err(()),
        })
    }
}

/// How a condition joins the conditions before it on the same field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    /// Written with a `|` prefix, e.g. `|==`
    Or,
}

/// One `(operator, value)` entry under a field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub operator: Operator,
    pub combinator: Combinator,
    pub value: Value,
}

impl Condition {
    pub fn and(operator: Operator, value: Value) -> Self {
        Self {
            operator,
            combinator: Combinator::And,
            value,
        }
    }

    pub fn or(operator: Operator, value: Value) -> Self {
        Self {
            operator,
            combinator: Combinator::Or,
            value,
        }
    }

    /// Parses an operator key such as `>=` or `|in`
    pub fn parse(field: &str, key: &str, value: Value) -> PlannerResult<Self> {
        let (combinator, symbol) = match key.strip_prefix('|') {
            Some(rest) => (Combinator::Or, rest),
            None => (Combinator::And, key),
        };
        let operator = symbol
            .parse::<Operator>()
            .map_err(|_| PlannerError::unknown_operator(field, key))?;
        Ok(Self {
            operator,
            combinator,
            value,
        })
    }

    /// Returns the operator key as written in a `where` clause
    pub fn key(&self) -> String {
        match self.combinator {
            Combinator::And => self.operator.as_str().to_string(),
            Combinator::Or => format!("|{}", self.operator.as_str()),
        }
    }
}

/// Conditions for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub conditions: Vec<Condition>,
}

/// Normalized `where` clause; field order is significant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    fields: Vec<FieldFilter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `where` object. A non-object value under a field is
    /// shorthand for `{"==": value}`.
    pub fn from_json(value: &Value) -> PlannerResult<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Self::from_map(map),
            other => Err(PlannerError::InvalidWhere(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> PlannerResult<Self> {
        let mut spec = Self::new();
        for (field, criteria) in map {
            let conditions = match criteria {
                Value::Object(ops) => ops
                    .iter()
                    .map(|(key, v)| Condition::parse(field, key, v.clone()))
                    .collect::<PlannerResult<Vec<_>>>()?,
                bare => vec![Condition::and(Operator::Eq, bare.clone())],
            };
            spec.set(field.clone(), conditions);
        }
        Ok(spec)
    }

    /// Replaces the conditions of `field`, keeping its position if present
    pub fn set(&mut self, field: impl Into<String>, conditions: Vec<Condition>) {
        let field = field.into();
        match self.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.conditions = conditions,
            None => self.fields.push(FieldFilter { field, conditions }),
        }
    }

    /// Appends a condition to `field`
    pub fn push(&mut self, field: impl Into<String>, condition: Condition) {
        let field = field.into();
        match self.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.conditions.push(condition),
            None => self.fields.push(FieldFilter {
                field,
                conditions: vec![condition],
            }),
        }
    }

    pub fn fields(&self) -> &[FieldFilter] {
        &self.fields
    }

    /// True when no field carries a condition
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.conditions.is_empty())
    }

    /// Renders the filter back to its JSON form
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for field in &self.fields {
            let mut ops = Map::new();
            for cond in &field.conditions {
                ops.insert(cond.key(), cond.value.clone());
            }
            out.insert(field.field.clone(), Value::Object(ops));
        }
        Value::Object(out)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Case-insensitive; anything but "desc" sorts ascending
    pub fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    /// True for "asc"/"desc" in any case
    pub fn is_keyword(s: &str) -> bool {
        s.eq_ignore_ascii_case("asc") || s.eq_ignore_ascii_case("desc")
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

impl SortClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_str())
    }
}
