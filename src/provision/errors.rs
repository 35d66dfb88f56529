//! Provisioning error types

use thiserror::Error;

use crate::executor::ExecutorError;

/// Result type for provisioning
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Creation or readiness wait of a schema object failed.
///
/// Cloned to every waiter of the same registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to provision {kind} '{target}': {source}")]
pub struct ProvisionError {
    /// `database`, `table`, `index` or `index_wait`
    pub kind: &'static str,
    /// `db`, `db.table` or `db.table#index`
    pub target: String,
    #[source]
    pub source: ExecutorError,
}

impl ProvisionError {
    pub fn code(&self) -> &'static str {
        "PROVISION_FAILED"
    }
}
