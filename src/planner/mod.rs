//! Query planner
//!
//! Translates ORM-style query parameters into native query plans.
//!
//! # Pipeline
//!
//! 1. Normalize aliases and fold loose keys into `where` (`params`)
//! 2. Select the target table
//! 3. Compile `where` into a boolean expression (`compiler`)
//! 4. Attach order-by, skip and limit stages (`plan`)
//!
//! # Design Principles
//!
//! - Deterministic: same inputs → same plan
//! - Pure: caller input is never mutated
//! - Closed operator set, matched exhaustively

mod ast;
mod compiler;
mod errors;
mod expr;
mod params;
mod plan;

pub use ast::{
    Combinator, Condition, FieldFilter, FilterSpec, Operator, SortClause, SortDirection,
};
pub use compiler::compile;
pub use errors::{PlannerError, PlannerResult};
pub use expr::{as_collection, compare_values, field_or_null, json_eq, Comparison, Expr};
pub use params::{QueryParams, RESERVED_KEYS};
pub use plan::{Plan, QueryPlanner, Stage, TableRef};
