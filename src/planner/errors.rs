//! Planner error types
//!
//! Raised while normalizing caller-supplied query parameters. A planner
//! error means the request is malformed; nothing has touched the database.

use thiserror::Error;

/// Result type for planning
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Malformed query input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// Operator key not in the supported set
    #[error("Unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// `where` is neither an object nor null
    #[error("Invalid where clause: {0}")]
    InvalidWhere(String),

    /// Query parameters are not an object
    #[error("Invalid query parameters: {0}")]
    InvalidParams(String),

    /// `orderBy`/`sort` has an unusable shape
    #[error("Invalid orderBy: {0}")]
    InvalidOrderBy(String),

    /// `skip`/`offset`/`limit` is negative or not an integer
    #[error("Invalid {key}: {reason}")]
    InvalidPagination { key: String, reason: String },
}

impl PlannerError {
    pub fn unknown_operator(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            field: field.into(),
            operator: operator.into(),
        }
    }

    pub fn invalid_pagination(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPagination {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOperator { .. } => "QUERY_UNKNOWN_OPERATOR",
            Self::InvalidWhere(_) => "QUERY_INVALID_WHERE",
            Self::InvalidParams(_) => "QUERY_INVALID_PARAMS",
            Self::InvalidOrderBy(_) => "QUERY_INVALID_ORDER_BY",
            Self::InvalidPagination { .. } => "QUERY_INVALID_PAGINATION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operator_message() {
        let err = PlannerError::unknown_operator("age", "~=");
        assert_eq!(err.to_string(), "Unknown operator '~=' on field 'age'");
        assert_eq!(err.code(), "QUERY_UNKNOWN_OPERATOR");
    }

    #[test]
    fn test_pagination_message() {
        let err = PlannerError::invalid_pagination("limit", "must not be negative");
        assert_eq!(err.to_string(), "Invalid limit: must not be negative");
    }
}
