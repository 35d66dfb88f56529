//! Executor error types
//!
//! Anything the database driver reports. The adapter passes these through
//! unchanged and adds no retry layer.

use thiserror::Error;

/// Result type for executor calls
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failure reported by a `DocumentExecutor`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Database '{0}' does not exist")]
    DatabaseMissing(String),

    #[error("Table '{0}' does not exist")]
    TableMissing(String),

    #[error("Index '{index}' on table '{table}' does not exist")]
    IndexMissing { table: String, index: String },

    #[error("Index '{index}' on table '{table}' is not ready")]
    IndexNotReady { table: String, index: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Result did not have the shape the operation expects
    #[error("Unexpected result: expected {expected}, got {actual}")]
    UnexpectedShape {
        expected: &'static str,
        actual: &'static str,
    },

    /// Connectivity, permission or driver failure
    #[error("Execution failed: {0}")]
    Failed(String),
}

impl ExecutorError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    pub fn unexpected_shape(expected: &'static str, actual: &'static str) -> Self {
        Self::UnexpectedShape { expected, actual }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseMissing(_) => "EXEC_DATABASE_MISSING",
            Self::TableMissing(_) => "EXEC_TABLE_MISSING",
            Self::IndexMissing { .. } => "EXEC_INDEX_MISSING",
            Self::IndexNotReady { .. } => "EXEC_INDEX_NOT_READY",
            Self::InvalidDocument(_) => "EXEC_INVALID_DOCUMENT",
            Self::UnexpectedShape { .. } => "EXEC_UNEXPECTED_SHAPE",
            Self::Failed(_) => "EXEC_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ExecutorError::TableMissing("test.users".into()).to_string(),
            "Table 'test.users' does not exist"
        );
        assert_eq!(
            ExecutorError::unexpected_shape("changes", "documents").to_string(),
            "Unexpected result: expected changes, got documents"
        );
    }

    #[test]
    fn test_codes_unique() {
        let errors = [
            ExecutorError::DatabaseMissing("d".into()),
            ExecutorError::TableMissing("t".into()),
            ExecutorError::IndexMissing {
                table: "t".into(),
                index: "i".into(),
            },
            ExecutorError::IndexNotReady {
                table: "t".into(),
                index: "i".into(),
            },
            ExecutorError::InvalidDocument("x".into()),
            ExecutorError::unexpected_shape("a", "b"),
            ExecutorError::failed("x"),
        ];
        let mut codes: Vec<_> = errors.iter().map(ExecutorError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
