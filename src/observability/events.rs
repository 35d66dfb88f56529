//! Observable adapter events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events emitted by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Provisioning
    /// Creation request for a database/table/index issued
    ProvisionStart,
    /// Database/table/index exists and is usable
    ProvisionComplete,
    /// Creation or readiness wait failed
    ProvisionFailed,

    // Queries
    /// Plan built for a read or bulk write
    QueryPlanned,
    /// Query ran through the executor
    QueryExecuted,
    /// Relation sub-fetches merged into a document
    RelationMerged,
    /// Single-entity fetch found nothing
    NotFound,

    // Writes
    /// Write acknowledged by the executor
    WriteCommit,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ProvisionStart => "PROVISION_START",
            Event::ProvisionComplete => "PROVISION_COMPLETE",
            Event::ProvisionFailed => "PROVISION_FAILED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::RelationMerged => "RELATION_MERGED",
            Event::NotFound => "NOT_FOUND",
            Event::WriteCommit => "WRITE_COMMIT",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::ProvisionFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
