//! Schema provisioning
//!
//! Databases, tables and secondary indexes are created lazily, the first time
//! an operation touches them.
//!
//! # Invariants
//!
//! - At most one creation request per database, table or index key per
//!   provisioner instance
//! - Concurrent callers for a key share one outcome
//! - Failed outcomes stay cached; there is no automatic retry
//! - No lock is held across an await

mod errors;
mod provisioner;
mod registry;

pub use errors::{ProvisionError, ProvisionResult};
pub use provisioner::SchemaProvisioner;
pub use registry::{ProvisionRegistry, ProvisionStatus, ReadySignal, SignalMap};
