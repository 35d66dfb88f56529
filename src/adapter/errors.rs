//! Adapter error types

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::planner::PlannerError;
use crate::provision::ProvisionError;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors surfaced by CRUD operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// Single-entity lookup found nothing
    #[error("Not Found")]
    NotFound,

    /// A requested relation names a resource the provider does not know
    #[error("Unknown related resource: {0}")]
    UnknownRelatedResource(String),

    #[error(transparent)]
    Provisioning(#[from] ProvisionError),

    /// Driver failure, passed through unchanged
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    InvalidQuery(#[from] PlannerError),
}

impl AdapterError {
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::NotFound => "NOT_FOUND",
            AdapterError::UnknownRelatedResource(_) => "UNKNOWN_RELATED_RESOURCE",
            AdapterError::Provisioning(err) => err.code(),
            AdapterError::Executor(err) => err.code(),
            AdapterError::InvalidQuery(err) => err.code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound)
    }
}
