//! Executor boundary
//!
//! The database driver is opaque to the adapter: it accepts provisioning
//! requests and queries, and returns rows or change sets. Connection
//! pooling, wire protocol and cursor handling live behind this trait.
//!
//! `MemoryExecutor` is an in-process implementation with the same contract.

mod errors;
mod memory;
mod query;
mod sorter;

use std::future::Future;
use std::pin::Pin;

pub use errors::{ExecutorError, ExecutorResult};
pub use memory::MemoryExecutor;
pub use query::{Change, ProvisionRequest, Query, QueryOutput, RunOptions, Target, WriteSummary};
pub use sorter::ResultSorter;

/// Boxed future returned by executor calls
pub type ExecFuture<'a, T> = Pin<Box<dyn Future<Output = ExecutorResult<T>> + Send + 'a>>;

/// Database driver seam
pub trait DocumentExecutor: Send + Sync {
    /// Creates a schema object if missing. Returns true if it was created
    /// (or, for `WaitIndex`, once the index is ready).
    fn provision(&self, request: ProvisionRequest) -> ExecFuture<'_, bool>;

    /// Runs one query
    fn run(&self, query: Query, options: RunOptions) -> ExecFuture<'_, QueryOutput>;
}
