//! Boolean expression tree evaluated per candidate row
//!
//! Missing fields read as null, or as an empty collection for set leaves,
//! so no leaf fails on an absent field.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

/// Scalar comparison kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Gt => "gt",
            Comparison::Gte => "ge",
            Comparison::Lt => "lt",
            Comparison::Lte => "le",
        }
    }
}

/// Compiled filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `row[field].default(null) <cmp> value`
    Compare {
        field: String,
        cmp: Comparison,
        value: Value,
    },
    /// `values.contains(row[field].default(null))`, optionally negated
    Member {
        field: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// `row[field].default([]) ∩ values` is empty (or non-empty)
    Intersect {
        field: String,
        values: Vec<Value>,
        expect_empty: bool,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn and(self, rhs: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(rhs))
    }

    /// Evaluates the expression against one document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Expr::Compare { field, cmp, value } => {
                let actual = field_or_null(doc, field);
                let ordering = compare_values(actual, value);
                match cmp {
                    Comparison::Eq => json_eq(actual, value),
                    Comparison::Ne => !json_eq(actual, value),
                    Comparison::Gt => ordering == Ordering::Greater,
                    Comparison::Gte => ordering != Ordering::Less,
                    Comparison::Lt => ordering == Ordering::Less,
                    Comparison::Lte => ordering != Ordering::Greater,
                }
            }
            Expr::Member {
                field,
                values,
                negated,
            } => {
                let actual = field_or_null(doc, field);
                let found = values.iter().any(|v| json_eq(v, actual));
                found != *negated
            }
            Expr::Intersect {
                field,
                values,
                expect_empty,
            } => {
                let actual = as_collection(field_or_null(doc, field));
                let overlaps = actual
                    .iter()
                    .any(|a| values.iter().any(|v| json_eq(a, v)));
                overlaps != *expect_empty
            }
            Expr::And(lhs, rhs) => lhs.matches(doc) && rhs.matches(doc),
            Expr::Or(lhs, rhs) => lhs.matches(doc) || rhs.matches(doc),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { field, cmp, value } => {
                write!(f, "row({}).{}({})", field, cmp.as_str(), value)
            }
            Expr::Member {
                field,
                values,
                negated,
            } => {
                let values = Value::Array(values.clone());
                if *negated {
                    write!(f, "not({}.contains(row({})))", values, field)
                } else {
                    write!(f, "{}.contains(row({}))", values, field)
                }
            }
            Expr::Intersect {
                field,
                values,
                expect_empty,
            } => {
                let values = Value::Array(values.clone());
                let cmp = if *expect_empty { "eq" } else { "ne" };
                write!(f, "row({}).intersect({}).count().{}(0)", field, values, cmp)
            }
            Expr::And(lhs, rhs) => write!(f, "({} and {})", lhs, rhs),
            Expr::Or(lhs, rhs) => write!(f, "({} or {})", lhs, rhs),
        }
    }
}

static NULL: Value = Value::Null;

/// Reads a top-level field, treating a missing field as null
pub fn field_or_null<'a>(doc: &'a Value, field: &str) -> &'a Value {
    doc.get(field).unwrap_or(&NULL)
}

/// Views a value as a collection: null is empty, a scalar is a singleton
pub fn as_collection(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Value equality with numbers compared numerically (1 == 1.0)
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Ordering::Equal,
        (Value::Array(a_items), Value::Array(b_items)) => {
            a_items.len() == b_items.len()
                && a_items.iter().zip(b_items).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a_map), Value::Object(b_map)) => {
            a_map.len() == b_map.len()
                && a_map
                    .iter()
                    .all(|(k, v)| b_map.get(k).is_some_and(|other| json_eq(v, other)))
        }
        _ => a == b,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values.
///
/// - null < bool < number < string < array < object
/// - Same type: natural order; arrays lexicographic; objects by sorted entries
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (a_rank, b_rank) = (type_rank(a), type_rank(b));
    if a_rank != b_rank {
        return a_rank.cmp(&b_rank);
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return xi.cmp(&yi);
            }
            let xf = x.as_f64().unwrap_or(0.0);
            let yf = y.as_f64().unwrap_or(0.0);
            xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xv, yv) in x.iter().zip(y) {
                let ord = compare_values(xv, yv);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut x_entries: Vec<_> = x.iter().collect();
            let mut y_entries: Vec<_> = y.iter().collect();
            x_entries.sort_by(|l, r| l.0.cmp(r.0));
            y_entries.sort_by(|l, r| l.0.cmp(r.0));
            for ((xk, xv), (yk, yv)) in x_entries.iter().zip(&y_entries) {
                let ord = xk.cmp(yk).then_with(|| compare_values(xv, yv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x_entries.len().cmp(&y_entries.len())
        }
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmp(field: &str, cmp: Comparison, value: Value) -> Expr {
        Expr::Compare {
            field: field.into(),
            cmp,
            value,
        }
    }

    #[test]
    fn test_missing_field_reads_null() {
        let doc = json!({"name": "Alice"});

        assert!(cmp("age", Comparison::Eq, Value::Null).matches(&doc));
        assert!(cmp("age", Comparison::Ne, json!(30)).matches(&doc));
        // null sorts below every number
        assert!(cmp("age", Comparison::Lt, json!(0)).matches(&doc));
        assert!(!cmp("age", Comparison::Gt, json!(0)).matches(&doc));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let doc = json!({"n": 1});
        assert!(cmp("n", Comparison::Eq, json!(1.0)).matches(&doc));
        assert!(cmp("n", Comparison::Lt, json!(1.5)).matches(&doc));
    }

    #[test]
    fn test_no_string_number_coercion() {
        let doc = json!({"value": 123});
        assert!(!cmp("value", Comparison::Eq, json!("123")).matches(&doc));
    }

    #[test]
    fn test_member() {
        let expr = Expr::Member {
            field: "role".into(),
            values: vec![json!("admin"), json!("owner")],
            negated: false,
        };
        assert!(expr.matches(&json!({"role": "owner"})));
        assert!(!expr.matches(&json!({"role": "guest"})));
        assert!(!expr.matches(&json!({})));

        let not_in = Expr::Member {
            field: "role".into(),
            values: vec![json!("admin")],
            negated: true,
        };
        assert!(not_in.matches(&json!({})));
        assert!(!not_in.matches(&json!({"role": "admin"})));
    }

    #[test]
    fn test_intersect() {
        let empty = Expr::Intersect {
            field: "tags".into(),
            values: vec![json!("a"), json!("b")],
            expect_empty: true,
        };
        assert!(empty.matches(&json!({"tags": ["c"]})));
        assert!(empty.matches(&json!({})));
        assert!(!empty.matches(&json!({"tags": ["b", "c"]})));

        let not_empty = Expr::Intersect {
            field: "tags".into(),
            values: vec![json!("a")],
            expect_empty: false,
        };
        assert!(not_empty.matches(&json!({"tags": ["a"]})));
        assert!(not_empty.matches(&json!({"tags": "a"})));
        assert!(!not_empty.matches(&json!({"tags": null})));
    }

    #[test]
    fn test_type_order() {
        let ordered = [
            json!(null),
            json!(false),
            json!(true),
            json!(-1),
            json!(2.5),
            json!("a"),
            json!([1]),
            json!({"a": 1}),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(compare_values(&pair[0], &pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn test_display() {
        let expr = cmp("age", Comparison::Gte, json!(20)).or(cmp("age", Comparison::Eq, json!(99)));
        assert_eq!(expr.to_string(), "(row(age).ge(20) or row(age).eq(99))");
    }
}
