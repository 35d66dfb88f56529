//! Predicate compiler
//!
//! Turns a `FilterSpec` into an `Expr`. Within a field, conditions fold left
//! in written order: plain operators join with AND, `|`-prefixed ones with
//! OR. Each field's expression is ANDed into the cross-field expression.

use super::ast::{Combinator, Condition, FilterSpec, Operator};
use super::expr::{as_collection, Comparison, Expr};

/// Compiles a filter. `None` means no filtering at all.
pub fn compile(spec: &FilterSpec) -> Option<Expr> {
    let mut running: Option<Expr> = None;

    for field in spec.fields() {
        let mut field_expr: Option<Expr> = None;

        for condition in &field.conditions {
            let leaf = compile_leaf(&field.field, condition);
            field_expr = Some(match field_expr {
                None => leaf,
                Some(prev) => match condition.combinator {
                    Combinator::And => prev.and(leaf),
                    Combinator::Or => prev.or(leaf),
                },
            });
        }

        if let Some(expr) = field_expr {
            running = Some(match running {
                None => expr,
                Some(prev) => prev.and(expr),
            });
        }
    }

    running
}

fn compile_leaf(field: &str, condition: &Condition) -> Expr {
    let field = field.to_string();
    let value = condition.value.clone();

    let compare = |cmp| Expr::Compare {
        field: field.clone(),
        cmp,
        value: value.clone(),
    };

    match condition.operator {
        Operator::Eq | Operator::StrictEq => compare(Comparison::Eq),
        Operator::Ne | Operator::StrictNe => compare(Comparison::Ne),
        Operator::Gt => compare(Comparison::Gt),
        Operator::Gte => compare(Comparison::Gte),
        Operator::Lt => compare(Comparison::Lt),
        Operator::Lte => compare(Comparison::Lte),
        Operator::In => Expr::Member {
            field,
            values: as_collection(&value),
            negated: false,
        },
        Operator::NotIn => Expr::Member {
            field,
            values: as_collection(&value),
            negated: true,
        },
        Operator::IsectEmpty => Expr::Intersect {
            field,
            values: as_collection(&value),
            expect_empty: true,
        },
        Operator::IsectNotEmpty => Expr::Intersect {
            field,
            values: as_collection(&value),
            expect_empty: false,
        },
    }
}
