//! Per-call options

use crate::executor::RunOptions;

/// Options accepted by every adapter operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOptions {
    /// Overrides the adapter's default database
    pub db: Option<String>,
    /// Relations to merge into `find` results, by related resource name or
    /// local field
    pub with: Vec<String>,
    pub raw: bool,
    /// Forwarded to the executor; also enables TRACE logging of plans
    pub debug: bool,
}

impl OperationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>) -> Self {
        self.with.push(name.into());
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn db(&self) -> Option<&str> {
        self.db.as_deref()
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            raw: self.raw,
            debug: self.debug,
        }
    }
}
