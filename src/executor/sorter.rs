//! Multi-key result sorting
//!
//! Sort is stable and deterministic. The first clause is the primary key;
//! later clauses break ties.

use std::cmp::Ordering;

use serde_json::Value;

use crate::planner::{compare_values, field_or_null, SortClause, SortDirection};

/// Sorts documents by order-by clauses
pub struct ResultSorter;

impl ResultSorter {
    pub fn sort(documents: &mut [Value], clauses: &[&SortClause]) {
        if clauses.is_empty() {
            return;
        }
        documents.sort_by(|a, b| Self::compare(a, b, clauses));
    }

    fn compare(a: &Value, b: &Value, clauses: &[&SortClause]) -> Ordering {
        for clause in clauses {
            let ordering = compare_values(
                field_or_null(a, &clause.field),
                field_or_null(b, &clause.field),
            );
            let ordering = match clause.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
